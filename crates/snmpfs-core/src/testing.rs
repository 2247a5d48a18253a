//! Test doubles for code that consumes a [`WalkTransport`].
//!
//! ```
//! use snmpfs_core::testing::{varbind, StaticWalk};
//! use snmpfs_core::{CacheManager, Oid, SnmpValue};
//!
//! let walk = StaticWalk::new(vec![varbind(
//!     ".1.3.6.1.2.1.1.1.0",
//!     SnmpValue::OctetString(b"test-system".to_vec()),
//! )]);
//! let cache = CacheManager::new();
//! cache.load_walk(&walk, &Oid::internet()).unwrap();
//! assert_eq!(cache.len(), 1);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::TransportError;
use crate::oid::Oid;
use crate::transport::{VarBind, WalkTransport};
use crate::value::SnmpValue;

/// Builds a [`VarBind`] from a dotted name.
///
/// # Panics
///
/// Panics if `name` is not a valid identifier.
pub fn varbind(name: &str, value: SnmpValue) -> VarBind {
    VarBind {
        name: Oid::parse(name).expect("test identifier must parse"),
        value,
    }
}

/// In-memory transport returning a fixed result set, or a fixed failure.
pub struct StaticWalk {
    result: Result<Vec<VarBind>, String>,
    calls: AtomicUsize,
}

impl StaticWalk {
    /// Returns `varbinds` on every walk.
    pub fn new(varbinds: Vec<VarBind>) -> Self {
        Self {
            result: Ok(varbinds),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails every walk with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            result: Err(reason.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns how many walks were requested.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl WalkTransport for StaticWalk {
    fn bulk_walk(&self, base: &Oid) -> Result<Vec<VarBind>, TransportError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match &self.result {
            Ok(varbinds) => Ok(varbinds
                .iter()
                .filter(|vb| vb.name.starts_with(base))
                .cloned()
                .collect()),
            Err(reason) => Err(TransportError::Walk {
                base: base.to_string(),
                reason: reason.clone(),
            }),
        }
    }
}
