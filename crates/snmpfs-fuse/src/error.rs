//! Error handling and errno mapping for the FUSE filesystem.
//!
//! Cache misses become `ENOENT`, attempts to modify anything become `EROFS`.
//! Unsupported value types are not errors at this layer: they are rendered
//! as diagnostic file content by the core crate.

use snmpfs_core::CacheError;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// FUSE-specific errors that can occur during filesystem operations.
#[derive(Debug, Error)]
pub enum FuseError {
    /// No entry with this name.
    #[error("No such entry: {0}")]
    NotFound(String),

    /// No entry with this inode.
    #[error("Invalid inode: {0}")]
    InvalidInode(u64),

    /// The filesystem is read-only.
    #[error("Read-only filesystem")]
    ReadOnly,

    /// Directory operation on a file.
    #[error("Not a directory: inode {0}")]
    NotADirectory(u64),

    /// File operation on the directory.
    #[error("Is a directory: inode {0}")]
    IsADirectory(u64),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Operation not supported.
    #[error("Operation not supported")]
    NotSupported,
}

impl FuseError {
    /// Converts this error to a libc error code for FUSE.
    pub fn to_errno(&self) -> i32 {
        match self {
            FuseError::NotFound(_) | FuseError::InvalidInode(_) => libc::ENOENT,
            FuseError::ReadOnly => libc::EROFS,
            FuseError::NotADirectory(_) => libc::ENOTDIR,
            FuseError::IsADirectory(_) => libc::EISDIR,
            FuseError::Io(e) => io_error_to_errno(e),
            FuseError::NotSupported => libc::ENOTSUP,
        }
    }
}

impl From<CacheError> for FuseError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::NotFound { name } => FuseError::NotFound(name),
            CacheError::UnknownInode(inode) => FuseError::InvalidInode(inode),
        }
    }
}

/// Converts an IO error to a libc error code.
pub fn io_error_to_errno(e: &io::Error) -> i32 {
    e.raw_os_error().unwrap_or(libc::EIO)
}

/// Result type for FUSE operations.
pub type FuseResult<T> = Result<T, FuseError>;

/// Errors attaching the filesystem to a mountpoint.
#[derive(Debug, Error)]
pub enum MountError {
    /// FUSE is not installed or not loaded.
    #[error("FUSE backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The mount syscall failed.
    #[error("Mount failed: {0}")]
    Mount(#[from] io::Error),

    /// The mount did not become ready in time.
    #[error("Mount did not become ready within {0:?}")]
    Timeout(Duration),
}
