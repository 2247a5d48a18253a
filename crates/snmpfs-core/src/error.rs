//! Error types for the OID cache and the SNMP transport.

use std::time::Duration;
use thiserror::Error;

pub use crate::bridge::BridgeError;
pub use crate::value::UnsupportedType;

/// Errors from parsing a dotted object identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OidError {
    /// The identifier has no arcs at all.
    #[error("empty object identifier")]
    Empty,

    /// Two consecutive dots, or a trailing dot.
    #[error("object identifier {0:?} contains an empty arc")]
    EmptyArc(String),

    /// An arc is not a decimal `u32`.
    #[error("object identifier {oid:?} has invalid arc {arc:?}")]
    InvalidArc { oid: String, arc: String },
}

/// Errors talking to the remote agent.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The agent address could not be resolved.
    #[error("failed to resolve agent address {address}: {source}")]
    Resolve {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The client session could not be set up.
    #[error("failed to connect to agent {address}: {reason}")]
    Connect { address: String, reason: String },

    /// The bulk walk request failed.
    #[error("bulk walk of {base} failed: {reason}")]
    Walk { base: String, reason: String },

    /// The agent returned an identifier that is not a valid OID.
    #[error("agent returned malformed identifier: {0}")]
    MalformedOid(#[from] OidError),

    /// The operation did not finish in time.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The async runtime backing the transport failed.
    #[error("transport runtime error: {0}")]
    Runtime(String),
}

impl From<BridgeError> for TransportError {
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::Timeout(d) => TransportError::Timeout(d),
            BridgeError::Cancelled => TransportError::Runtime("operation was cancelled".to_string()),
        }
    }
}

/// Errors from cache lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// No entry is cached under this name.
    #[error("no such entry: {name}")]
    NotFound { name: String },

    /// No entry carries this inode.
    #[error("unknown inode: {0}")]
    UnknownInode(u64),
}

/// Result type for cache lookups.
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_timeout_becomes_transport_timeout() {
        let e: TransportError = BridgeError::Timeout(Duration::from_secs(5)).into();
        assert!(matches!(e, TransportError::Timeout(d) if d == Duration::from_secs(5)));
    }

    #[test]
    fn test_bridge_cancel_becomes_runtime_error() {
        let e: TransportError = BridgeError::Cancelled.into();
        assert!(matches!(e, TransportError::Runtime(_)));
    }

    #[test]
    fn test_cache_error_display() {
        let e = CacheError::NotFound {
            name: ".9.9.9".to_string(),
        };
        assert!(e.to_string().contains(".9.9.9"));
        assert!(CacheError::UnknownInode(42).to_string().contains("42"));
    }

    #[test]
    fn test_transport_error_display() {
        let e = TransportError::Walk {
            base: ".1.3.6.1".to_string(),
            reason: "no response".to_string(),
        };
        let msg = e.to_string();
        assert!(msg.contains(".1.3.6.1"));
        assert!(msg.contains("no response"));
    }
}
