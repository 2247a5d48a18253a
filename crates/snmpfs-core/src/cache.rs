//! OID-to-inode cache manager.
//!
//! The [`CacheManager`] owns the bidirectional mapping between identifier
//! names and synthetic inode numbers, plus the typed value cached for each
//! name. It is filled by one bulk walk at startup and read concurrently by
//! the filesystem afterwards.
//!
//! # Invariants
//!
//! - `by_name[n].inode == i` if and only if `by_inode[i] == n`.
//! - Inodes are unique, never reused, and never `0` or [`ROOT_INODE`].
//! - A name is inserted at most once; re-walking skips known names.
//!
//! Both maps and the inode counter sit behind one `RwLock`, so an insert
//! updates all three as a single unit and readers never see an inode whose
//! entry is not yet visible.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, trace};

use crate::error::{CacheError, CacheResult, TransportError};
use crate::oid::Oid;
use crate::transport::{VarBind, WalkTransport};
use crate::value::{render, Rendered, SnmpValue, TypeTag};

/// Inode of the single exposed directory (FUSE convention).
pub const ROOT_INODE: u64 = 1;

/// First inode handed out to a cached entry.
pub const FIRST_ENTRY_INODE: u64 = ROOT_INODE + 1;

/// One cached identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Canonical dotted name, also the exposed file name.
    pub name: String,
    /// Synthetic inode, immutable once assigned.
    pub inode: u64,
    /// The value delivered by the walk.
    pub value: SnmpValue,
}

impl CacheEntry {
    /// Returns the wire type of the cached value.
    pub fn type_tag(&self) -> TypeTag {
        self.value.type_tag()
    }

    /// Renders the cached value into file content.
    pub fn render(&self) -> Rendered {
        render(&self.name, &self.value)
    }
}

/// Lifecycle phase of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The startup walk is running; the filesystem is not mounted yet.
    Loading,
    /// Steady state: read-only access from filesystem callbacks.
    Serving,
}

/// Outcome of one walk ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Variable bindings returned by the transport.
    pub received: usize,
    /// Names seen for the first time.
    pub inserted: usize,
    /// Names already cached, left untouched.
    pub skipped: usize,
}

struct CacheState {
    /// Authoritative store.
    by_name: HashMap<String, Arc<CacheEntry>>,
    /// Reverse index.
    by_inode: HashMap<u64, String>,
    /// Next inode to hand out.
    next_inode: u64,
}

impl CacheState {
    fn new() -> Self {
        Self {
            by_name: HashMap::new(),
            by_inode: HashMap::new(),
            next_inode: FIRST_ENTRY_INODE,
        }
    }

    /// Inserts a binding unless its name is known. Returns true on insert.
    fn insert(&mut self, varbind: VarBind) -> bool {
        let name = varbind.name.to_dotted();
        if let Some(existing) = self.by_name.get(&name) {
            debug!(name = %name, inode = existing.inode, "walk: already cached, skipping");
            return false;
        }

        let inode = self.next_inode;
        self.next_inode += 1;

        trace!(name = %name, inode, type_tag = %varbind.value.type_tag(), "walk: caching new entry");
        self.by_inode.insert(inode, name.clone());
        self.by_name.insert(
            name.clone(),
            Arc::new(CacheEntry {
                name,
                inode,
                value: varbind.value,
            }),
        );
        true
    }
}

/// Shared cache of walked identifiers.
///
/// Construct once, fill with [`load_walk`](Self::load_walk), call
/// [`mark_serving`](Self::mark_serving), then hand an `Arc` to the
/// filesystem nodes.
pub struct CacheManager {
    state: RwLock<CacheState>,
    serving: AtomicBool,
}

impl CacheManager {
    /// Creates an empty cache in the [`Phase::Loading`] phase.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CacheState::new()),
            serving: AtomicBool::new(false),
        }
    }

    /// Walks the subtree under `base` and caches every new name.
    ///
    /// Names that are already cached are skipped, so calling this again is
    /// safe and never changes an existing inode. The result order of the
    /// transport is not preserved in any way.
    ///
    /// The network round trip happens before the write lock is taken;
    /// concurrent readers are only blocked while the results are ingested.
    pub fn load_walk(
        &self,
        transport: &dyn WalkTransport,
        base: &Oid,
    ) -> Result<WalkSummary, TransportError> {
        info!(base = %base, "Loading subtree");
        let varbinds = transport.bulk_walk(base)?;
        let summary = self.insert_varbinds(varbinds);
        info!(
            base = %base,
            received = summary.received,
            inserted = summary.inserted,
            skipped = summary.skipped,
            total = self.len(),
            "Subtree loaded"
        );
        Ok(summary)
    }

    /// Ingests walk results. This is the pure half of [`load_walk`](Self::load_walk).
    pub fn insert_varbinds<I>(&self, varbinds: I) -> WalkSummary
    where
        I: IntoIterator<Item = VarBind>,
    {
        let mut summary = WalkSummary::default();
        let mut state = self.state.write();
        for varbind in varbinds {
            summary.received += 1;
            if state.insert(varbind) {
                summary.inserted += 1;
            } else {
                summary.skipped += 1;
            }
        }
        summary
    }

    /// Looks up an entry by name.
    pub fn lookup(&self, name: &str) -> CacheResult<Arc<CacheEntry>> {
        self.state
            .read()
            .by_name
            .get(name)
            .cloned()
            .ok_or_else(|| CacheError::NotFound {
                name: name.to_string(),
            })
    }

    /// Resolves an inode back to its name.
    pub fn resolve_inode(&self, inode: u64) -> CacheResult<String> {
        self.state
            .read()
            .by_inode
            .get(&inode)
            .cloned()
            .ok_or(CacheError::UnknownInode(inode))
    }

    /// Resolves an inode straight to its entry under one read lock.
    pub fn entry_by_inode(&self, inode: u64) -> CacheResult<Arc<CacheEntry>> {
        let state = self.state.read();
        state
            .by_inode
            .get(&inode)
            .and_then(|name| state.by_name.get(name))
            .cloned()
            .ok_or(CacheError::UnknownInode(inode))
    }

    /// Returns every cached entry, in no particular order.
    pub fn entries(&self) -> Vec<Arc<CacheEntry>> {
        self.state.read().by_name.values().cloned().collect()
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.state.read().by_name.len()
    }

    /// Returns true if nothing has been cached.
    pub fn is_empty(&self) -> bool {
        self.state.read().by_name.is_empty()
    }

    /// Returns the current lifecycle phase.
    pub fn phase(&self) -> Phase {
        if self.serving.load(Ordering::Acquire) {
            Phase::Serving
        } else {
            Phase::Loading
        }
    }

    /// Moves the cache into [`Phase::Serving`]. There is no way back.
    pub fn mark_serving(&self) {
        if !self.serving.swap(true, Ordering::AcqRel) {
            info!(entries = self.len(), "Cache is serving");
        }
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}
