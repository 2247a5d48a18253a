//! FUSE filesystem exposing the cached MIB entries.
//!
//! Every request is answered from the [`CacheManager`] without touching the
//! network: the walk happened before the mount. The tree is a single
//! directory (inode 1) of read-only files named by dotted identifier.
//!
//! | Operation | Behavior |
//! |-----------|----------|
//! | lookup | Root only; name is the dotted identifier |
//! | getattr | Size is the rendered content length |
//! | open | Read-only opens only, `EROFS` otherwise |
//! | read | Offset/size slice of the rendered content |
//! | readdir | `.`, `..`, then entries in inode order |
//! | statfs | One inode per entry plus the root, no free space |
//! | setattr/write/create/mkdir/unlink/rmdir/rename | `EROFS` |
//! | xattr | `ENOTSUP` |

use crate::config::MountConfig;
use crate::error::{FuseError, FuseResult};
use crate::node::{DirEntry, Node, NodeAttr, NodeKind, SnmpRoot};
use fuser::{
    FileAttr, FileType, Filesystem, KernelConfig, ReplyAttr, ReplyCreate, ReplyData,
    ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, ReplyWrite, Request, TimeOrNow,
};
use libc::c_int;
use snmpfs_core::{CacheManager, Phase, ROOT_INODE};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, trace, warn};

/// Block size for filesystem statistics.
const BLOCK_SIZE: u32 = 4096;

/// Longest name reported by statfs.
const MAX_NAME_LEN: u32 = 255;

/// Read-only FUSE filesystem over a populated [`CacheManager`].
pub struct SnmpFS {
    root: SnmpRoot,
    attr_ttl: Duration,
    /// Timestamp reported for every node.
    mounted_at: SystemTime,
    uid: u32,
    gid: u32,
    /// Sorted root listing, rebuilt only when the entry count changes.
    listing: Option<Arc<Vec<DirEntry>>>,
}

impl SnmpFS {
    /// Creates the filesystem over `cache`.
    ///
    /// The cache should already be serving; a cache still loading is
    /// accepted but logged, since its listing may change under the kernel.
    pub fn new(cache: Arc<CacheManager>, config: &MountConfig) -> Self {
        if cache.phase() == Phase::Loading {
            warn!("Filesystem created over a cache that is still loading");
        }
        // SAFETY: getuid/getgid have no preconditions and cannot fail.
        let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
        Self {
            root: SnmpRoot::new(cache),
            attr_ttl: config.attr_ttl,
            mounted_at: SystemTime::now(),
            uid,
            gid,
            listing: None,
        }
    }

    /// Returns the node tree.
    pub fn root(&self) -> &SnmpRoot {
        &self.root
    }

    /// Converts node attributes into the kernel's form.
    fn file_attr(&self, attr: &NodeAttr) -> FileAttr {
        let (kind, nlink, blocks) = match attr.kind {
            NodeKind::Directory => (FileType::Directory, 2, 0),
            NodeKind::RegularFile => (
                FileType::RegularFile,
                1,
                attr.size.div_ceil(u64::from(BLOCK_SIZE)),
            ),
        };
        FileAttr {
            ino: attr.inode,
            size: attr.size,
            blocks,
            atime: self.mounted_at,
            mtime: self.mounted_at,
            ctime: self.mounted_at,
            crtime: self.mounted_at,
            kind,
            perm: attr.perm,
            nlink,
            uid: self.uid,
            gid: self.gid,
            rdev: 0,
            blksize: BLOCK_SIZE,
            flags: 0,
        }
    }

    fn lookup_child(&self, parent: u64, name: &OsStr) -> FuseResult<FileAttr> {
        if parent != ROOT_INODE {
            return match self.root.node_for_inode(parent)? {
                Node::File(_) => Err(FuseError::NotADirectory(parent)),
                Node::Directory(_) => Err(FuseError::InvalidInode(parent)),
            };
        }
        let name = name
            .to_str()
            .ok_or_else(|| FuseError::NotFound(name.to_string_lossy().into_owned()))?;
        let file = self.root.root().lookup(name)?;
        Ok(self.file_attr(&file.attr()?))
    }

    /// Full listing of the root directory in a stable order, with `.` and
    /// `..` first. Offsets handed to the kernel index into this list.
    ///
    /// Entries are never removed from the cache, so a changed count is the
    /// only way the listing can go stale.
    fn directory_listing(&mut self) -> Arc<Vec<DirEntry>> {
        let expected = self.root.cache().len() + 2;
        if let Some(listing) = &self.listing
            && listing.len() == expected
        {
            return Arc::clone(listing);
        }
        let listing = Arc::new(self.build_listing());
        debug!(entries = listing.len(), "Built root listing");
        self.listing = Some(Arc::clone(&listing));
        listing
    }

    fn build_listing(&self) -> Vec<DirEntry> {
        let mut entries = self.root.root().read_dir_all();
        entries.sort_unstable_by_key(|entry| entry.inode);

        let mut listing = Vec::with_capacity(entries.len() + 2);
        for dot in [".", ".."] {
            listing.push(DirEntry {
                inode: ROOT_INODE,
                name: dot.to_string(),
                kind: NodeKind::Directory,
            });
        }
        listing.extend(entries);
        listing
    }

    fn read_file(&self, ino: u64, offset: i64, size: u32) -> FuseResult<Vec<u8>> {
        let offset = u64::try_from(offset).map_err(|_| {
            FuseError::Io(std::io::Error::from_raw_os_error(libc::EINVAL))
        })?;
        self.root.file(ino)?.read(offset, size as usize)
    }
}

/// Rejects any open that asks for write access or truncation.
fn check_read_only_open(flags: i32) -> FuseResult<()> {
    let wants_write = (flags & libc::O_ACCMODE) != libc::O_RDONLY;
    let wants_trunc = (flags & libc::O_TRUNC) != 0;
    if wants_write || wants_trunc {
        Err(FuseError::ReadOnly)
    } else {
        Ok(())
    }
}

fn file_type(kind: NodeKind) -> FileType {
    match kind {
        NodeKind::Directory => FileType::Directory,
        NodeKind::RegularFile => FileType::RegularFile,
    }
}

impl Filesystem for SnmpFS {
    fn init(&mut self, _req: &Request<'_>, config: &mut KernelConfig) -> Result<(), c_int> {
        info!(entries = self.root.cache().len(), "FUSE filesystem initialized");
        config.add_capabilities(fuser::consts::FUSE_ASYNC_READ).ok();
        Ok(())
    }

    fn destroy(&mut self) {
        info!("FUSE filesystem destroyed");
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        trace!(parent, name = ?name, "lookup");
        match self.lookup_child(parent, name) {
            Ok(attr) => reply.entry(&self.attr_ttl, &attr, 0),
            Err(e) => {
                trace!(parent, name = ?name, error = %e, "lookup failed");
                reply.error(e.to_errno());
            }
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        trace!(inode = ino, "getattr");
        match self.root.node_for_inode(ino).and_then(|node| node.attr()) {
            Ok(attr) => reply.attr(&self.attr_ttl, &self.file_attr(&attr)),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        trace!(inode = ino, flags, "open");
        let result = check_read_only_open(flags).and_then(|()| self.root.file(ino));
        match result {
            Ok(_) => reply.opened(0, 0),
            Err(e) => {
                debug!(inode = ino, flags, error = %e, "open rejected");
                reply.error(e.to_errno());
            }
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        trace!(inode = ino, offset, size, "read");
        match self.read_file(ino, offset, size) {
            Ok(data) => reply.data(&data),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn opendir(&mut self, _req: &Request<'_>, ino: u64, _flags: i32, reply: ReplyOpen) {
        trace!(inode = ino, "opendir");
        match self.root.node_for_inode(ino) {
            Ok(Node::Directory(_)) => reply.opened(0, 0),
            Ok(Node::File(_)) => reply.error(libc::ENOTDIR),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        trace!(inode = ino, offset, "readdir");
        if ino != ROOT_INODE {
            let errno = match self.root.node_for_inode(ino) {
                Ok(_) => libc::ENOTDIR,
                Err(e) => e.to_errno(),
            };
            reply.error(errno);
            return;
        }

        let listing = self.directory_listing();
        let skip = usize::try_from(offset).unwrap_or(0);
        for (i, entry) in listing.iter().enumerate().skip(skip) {
            // The offset handed back is that of the next entry.
            let next = i64::try_from(i + 1).unwrap_or(i64::MAX);
            if reply.add(entry.inode, next, file_type(entry.kind), &entry.name) {
                break;
            }
        }
        reply.ok();
    }

    fn releasedir(&mut self, _req: &Request<'_>, _ino: u64, _fh: u64, _flags: i32, reply: ReplyEmpty) {
        reply.ok();
    }

    fn access(&mut self, _req: &Request<'_>, ino: u64, mask: i32, reply: ReplyEmpty) {
        trace!(inode = ino, mask, "access");
        if mask & libc::W_OK != 0 {
            reply.error(libc::EROFS);
            return;
        }
        match self.root.node_for_inode(ino) {
            Ok(_) => reply.ok(),
            Err(e) => reply.error(e.to_errno()),
        }
    }

    fn statfs(&mut self, _req: &Request<'_>, _ino: u64, reply: fuser::ReplyStatfs) {
        let files = self.root.cache().len() as u64 + 1;
        reply.statfs(
            0,            // blocks
            0,            // bfree
            0,            // bavail
            files,        // files
            0,            // ffree
            BLOCK_SIZE,   // bsize
            MAX_NAME_LEN, // namelen
            BLOCK_SIZE,   // frsize
        );
    }

    // ==================== Rejected Operations ====================

    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        _size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        debug!(inode = ino, "setattr rejected");
        reply.error(FuseError::ReadOnly.to_errno());
    }

    fn write(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        _offset: i64,
        _data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        debug!(inode = ino, "write rejected");
        reply.error(FuseError::ReadOnly.to_errno());
    }

    fn create(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        debug!(name = ?name, "create rejected");
        reply.error(FuseError::ReadOnly.to_errno());
    }

    fn mkdir(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        debug!(name = ?name, "mkdir rejected");
        reply.error(FuseError::ReadOnly.to_errno());
    }

    fn unlink(&mut self, _req: &Request<'_>, _parent: u64, name: &OsStr, reply: ReplyEmpty) {
        debug!(name = ?name, "unlink rejected");
        reply.error(FuseError::ReadOnly.to_errno());
    }

    fn rmdir(&mut self, _req: &Request<'_>, _parent: u64, name: &OsStr, reply: ReplyEmpty) {
        debug!(name = ?name, "rmdir rejected");
        reply.error(FuseError::ReadOnly.to_errno());
    }

    fn rename(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        name: &OsStr,
        _newparent: u64,
        _newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        debug!(name = ?name, "rename rejected");
        reply.error(FuseError::ReadOnly.to_errno());
    }

    fn getxattr(
        &mut self,
        _req: &Request<'_>,
        _ino: u64,
        _name: &OsStr,
        _size: u32,
        reply: fuser::ReplyXattr,
    ) {
        reply.error(FuseError::NotSupported.to_errno());
    }

    fn listxattr(&mut self, _req: &Request<'_>, _ino: u64, _size: u32, reply: fuser::ReplyXattr) {
        reply.error(FuseError::NotSupported.to_errno());
    }
}
