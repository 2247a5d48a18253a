//! Shared harness for tests that mount through the kernel.

#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use snmpfs_core::testing::StaticWalk;
use snmpfs_core::{CacheManager, Oid, VarBind};
use snmpfs_fuse::{FuseBackend, FuseMountHandle, MountConfig, SnmpFS};
use tempfile::TempDir;

/// A filesystem mounted on a temporary directory.
///
/// Unmounts on drop, before the directory is removed.
pub struct TestMount {
    handle: Option<FuseMountHandle>,
    _dir: TempDir,
    mountpoint: PathBuf,
}

impl TestMount {
    /// Mounts the given walk results.
    pub fn with_varbinds(varbinds: Vec<VarBind>) -> io::Result<Self> {
        let cache = Arc::new(CacheManager::new());
        cache
            .load_walk(&StaticWalk::new(varbinds), &Oid::internet())
            .map_err(io::Error::other)?;
        cache.mark_serving();

        let dir = tempfile::tempdir()?;
        let mountpoint = dir.path().join("mnt");
        std::fs::create_dir(&mountpoint)?;

        let config = MountConfig::default()
            .attr_ttl(Duration::from_secs(1))
            .mount_timeout(Duration::from_secs(5))
            .fs_name("snmp:test");
        let fs = SnmpFS::new(cache, &config);
        let handle = FuseBackend::with_timeouts(config.mount_timeout, Duration::from_millis(20))
            .mount(fs, &mountpoint, &config)
            .map_err(io::Error::other)?;

        Ok(Self {
            handle: Some(handle),
            _dir: dir,
            mountpoint,
        })
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.mountpoint.join(name)
    }

    pub fn root(&self) -> &Path {
        &self.mountpoint
    }

    /// Directory entry names, sorted.
    pub fn list(&self) -> io::Result<Vec<String>> {
        let mut names: Vec<String> = std::fs::read_dir(&self.mountpoint)?
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.path(name))
    }
}

impl Drop for TestMount {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.unmount();
        }
    }
}

/// Check if FUSE is available on this system.
pub fn fuse_available() -> bool {
    FuseBackend::new().is_available()
}

/// Mounts, or returns `None` with a note when the environment cannot mount.
pub fn try_mount(varbinds: Vec<VarBind>) -> Option<TestMount> {
    if !fuse_available() {
        eprintln!("Skipping test: FUSE not available on this system");
        return None;
    }
    match TestMount::with_varbinds(varbinds) {
        Ok(mount) => Some(mount),
        Err(e) => {
            eprintln!("Skipping test: {e}");
            None
        }
    }
}
