//! Core of snmpfs: an SNMP agent's information tree as cached, typed entries.
//!
//! This crate holds everything the filesystem needs except the filesystem
//! itself:
//!
//! - [`Oid`] - dotted numeric identifiers
//! - [`SnmpValue`] and [`render`] - typed values and their file rendering
//! - [`CacheManager`] - the name/inode bijection, filled by one bulk walk
//! - [`WalkTransport`] and [`SnmpV2cTransport`] - where walk results come from
//! - [`SnmpConfig`] - agent address, community, timeouts
//!
//! # Lifecycle
//!
//! ```ignore
//! use snmpfs_core::{CacheManager, SnmpConfig, SnmpV2cTransport};
//! use std::sync::Arc;
//!
//! let config = SnmpConfig::new("192.0.2.1");
//! let transport = SnmpV2cTransport::connect(&config)?;
//! let cache = Arc::new(CacheManager::new());
//! cache.load_walk(&transport, &config.base_oid)?;
//! cache.mark_serving();
//! // hand `cache` to the filesystem
//! ```

pub mod bridge;
pub mod cache;
pub mod config;
pub mod error;
pub mod oid;
pub mod testing;
pub mod transport;
pub mod value;

pub use bridge::BridgeSnapshot;
pub use cache::{CacheEntry, CacheManager, Phase, WalkSummary, FIRST_ENTRY_INODE, ROOT_INODE};
pub use config::SnmpConfig;
pub use error::{CacheError, CacheResult, OidError, TransportError};
pub use oid::Oid;
pub use transport::{SnmpV2cTransport, VarBind, WalkTransport};
pub use value::{render, Rendered, SnmpValue, TypeTag, UnsupportedType};
