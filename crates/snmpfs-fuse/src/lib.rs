//! FUSE filesystem for SNMP agents.
//!
//! Mounts the cached result of one bulk walk as a flat, read-only
//! directory: one file per object identifier, named by its dotted form,
//! containing its rendered value.
//!
//! # Usage
//!
//! ```ignore
//! use snmpfs_fuse::{FuseBackend, MountConfig, SnmpFS};
//!
//! let config = MountConfig::default();
//! let fs = SnmpFS::new(cache, &config);
//! let handle = FuseBackend::new().mount(fs, mountpoint, &config)?;
//! // ...
//! handle.unmount();
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod node;

pub use backend::{FuseBackend, FuseMountHandle};
pub use config::MountConfig;
pub use error::{FuseError, FuseResult, MountError};
pub use filesystem::SnmpFS;
pub use node::{DirEntry, DirectoryNode, FileNode, Node, NodeAttr, NodeKind, SnmpRoot};
