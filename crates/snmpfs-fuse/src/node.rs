//! Virtual nodes of the mounted tree.
//!
//! The tree is flat: one directory ([`DirectoryNode`], inode
//! [`ROOT_INODE`]) holding one read-only regular file ([`FileNode`]) per
//! cached identifier. Nodes carry no state beyond an inode number and a
//! shared handle to the [`CacheManager`]; everything else is read through
//! the manager on demand.

use std::sync::Arc;

use snmpfs_core::{CacheManager, Rendered, ROOT_INODE};
use tracing::{trace, warn};

use crate::error::{FuseError, FuseResult};

/// Directory permissions (r-xr-xr-x).
pub const DIR_PERM: u16 = 0o555;

/// File permissions (r--r--r--).
pub const FILE_PERM: u16 = 0o444;

/// Kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    RegularFile,
}

/// Attributes reported for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeAttr {
    pub inode: u64,
    /// Byte length of the rendered content (0 for the directory).
    pub size: u64,
    pub kind: NodeKind,
    pub perm: u16,
}

/// One directory listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub inode: u64,
    pub name: String,
    pub kind: NodeKind,
}

/// Either kind of node, as resolved from an inode.
#[derive(Debug, Clone)]
pub enum Node {
    Directory(DirectoryNode),
    File(FileNode),
}

impl Node {
    /// Returns the node's attributes.
    pub fn attr(&self) -> FuseResult<NodeAttr> {
        match self {
            Node::Directory(dir) => Ok(dir.attr()),
            Node::File(file) => file.attr(),
        }
    }
}

/// Composition root: hands out nodes sharing one cache.
#[derive(Clone)]
pub struct SnmpRoot {
    cache: Arc<CacheManager>,
}

impl SnmpRoot {
    pub fn new(cache: Arc<CacheManager>) -> Self {
        Self { cache }
    }

    /// Returns the single directory.
    pub fn root(&self) -> DirectoryNode {
        DirectoryNode {
            cache: Arc::clone(&self.cache),
        }
    }

    /// Resolves any inode to its node.
    pub fn node_for_inode(&self, inode: u64) -> FuseResult<Node> {
        if inode == ROOT_INODE {
            return Ok(Node::Directory(self.root()));
        }
        self.cache.resolve_inode(inode)?;
        Ok(Node::File(FileNode {
            inode,
            cache: Arc::clone(&self.cache),
        }))
    }

    /// Returns the file node for `inode`, rejecting the directory.
    pub fn file(&self, inode: u64) -> FuseResult<FileNode> {
        match self.node_for_inode(inode)? {
            Node::File(file) => Ok(file),
            Node::Directory(_) => Err(FuseError::IsADirectory(inode)),
        }
    }

    /// Returns the shared cache.
    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }
}

/// The one exposed directory.
#[derive(Clone)]
pub struct DirectoryNode {
    cache: Arc<CacheManager>,
}

impl std::fmt::Debug for DirectoryNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryNode").field("inode", &ROOT_INODE).finish()
    }
}

impl DirectoryNode {
    pub fn attr(&self) -> NodeAttr {
        NodeAttr {
            inode: ROOT_INODE,
            size: 0,
            kind: NodeKind::Directory,
            perm: DIR_PERM,
        }
    }

    /// Looks up a child by its dotted name.
    pub fn lookup(&self, name: &str) -> FuseResult<FileNode> {
        let entry = self.cache.lookup(name)?;
        trace!(name, inode = entry.inode, "lookup hit");
        Ok(FileNode {
            inode: entry.inode,
            cache: Arc::clone(&self.cache),
        })
    }

    /// Lists every cached entry. The order is unspecified.
    pub fn read_dir_all(&self) -> Vec<DirEntry> {
        self.cache
            .entries()
            .into_iter()
            .map(|entry| DirEntry {
                inode: entry.inode,
                name: entry.name.clone(),
                kind: NodeKind::RegularFile,
            })
            .collect()
    }
}

/// A read-only file backed by one cached entry.
#[derive(Clone)]
pub struct FileNode {
    inode: u64,
    cache: Arc<CacheManager>,
}

impl std::fmt::Debug for FileNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileNode").field("inode", &self.inode).finish()
    }
}

impl FileNode {
    pub fn inode(&self) -> u64 {
        self.inode
    }

    /// Returns attributes with `size` equal to the rendered length.
    ///
    /// Unlike [`read_all`](Self::read_all) this does not log entries without
    /// a renderer; `ls -l` stats every file.
    pub fn attr(&self) -> FuseResult<NodeAttr> {
        let entry = self.cache.entry_by_inode(self.inode)?;
        let size = entry.render().into_bytes().len() as u64;
        Ok(NodeAttr {
            inode: self.inode,
            size,
            kind: NodeKind::RegularFile,
            perm: FILE_PERM,
        })
    }

    /// Renders the whole file.
    ///
    /// A value without a renderer still reads successfully; its content is
    /// a diagnostic naming the entry, raw value and type.
    pub fn read_all(&self) -> FuseResult<Vec<u8>> {
        let entry = self.cache.entry_by_inode(self.inode)?;
        match entry.render() {
            Rendered::Content(bytes) => Ok(bytes),
            Rendered::Unsupported(unsupported) => {
                warn!(
                    name = %unsupported.name,
                    value = %unsupported.raw,
                    type_tag = %unsupported.type_tag,
                    "No renderer for value type"
                );
                Ok(unsupported.diagnostic())
            }
        }
    }

    /// Reads up to `size` bytes at `offset`.
    pub fn read(&self, offset: u64, size: usize) -> FuseResult<Vec<u8>> {
        let content = self.read_all()?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(content.len());
        let end = start.saturating_add(size).min(content.len());
        Ok(content[start..end].to_vec())
    }
}
