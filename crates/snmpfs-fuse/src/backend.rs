//! Mounting and unmounting the filesystem.

use crate::config::MountConfig;
use crate::error::MountError;
use crate::filesystem::SnmpFS;
use fuser::{BackgroundSession, MountOption};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Timeout for graceful session.join() before forcing unmount.
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default polling interval while waiting for the mount.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Handle to a mounted filesystem. Dropping it unmounts.
pub struct FuseMountHandle {
    session: Option<BackgroundSession>,
    mountpoint: PathBuf,
}

impl FuseMountHandle {
    pub fn mountpoint(&self) -> &Path {
        &self.mountpoint
    }

    /// Unmounts and waits for the session to finish.
    pub fn unmount(mut self) {
        tracing::info!(mountpoint = %self.mountpoint.display(), "Unmounting FUSE filesystem");
        self.join_or_force();
        tracing::info!(mountpoint = %self.mountpoint.display(), "FUSE unmount successful");
    }

    fn join_or_force(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            session.join();
            let _ = tx.send(());
        });

        match rx.recv_timeout(JOIN_TIMEOUT) {
            Ok(()) => {
                tracing::debug!(mountpoint = %self.mountpoint.display(), "Session joined");
            }
            Err(_) => {
                tracing::warn!(
                    "session.join() timed out after {:?} for {}, forcing unmount",
                    JOIN_TIMEOUT,
                    self.mountpoint.display()
                );
                self.force_unmount_impl();
            }
        }
    }

    /// Force unmount the filesystem using system tools.
    fn force_unmount_impl(&self) {
        #[cfg(target_os = "macos")]
        {
            let _ = std::process::Command::new("umount")
                .arg("-f")
                .arg(&self.mountpoint)
                .output();
        }

        #[cfg(target_os = "linux")]
        {
            let _ = std::process::Command::new("fusermount")
                .args(["-uz"])
                .arg(&self.mountpoint)
                .output();
        }
    }
}

impl Drop for FuseMountHandle {
    fn drop(&mut self) {
        if self.session.is_some() {
            tracing::debug!("Unmounting FUSE filesystem at {}", self.mountpoint.display());
            self.join_or_force();
        }
    }
}

/// Mounts [`SnmpFS`] instances through fuser.
#[derive(Debug, Clone, Copy)]
pub struct FuseBackend {
    /// Timeout for waiting for mount readiness
    pub mount_timeout: Duration,
    /// Polling interval when waiting for mount
    pub poll_interval: Duration,
}

impl Default for FuseBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FuseBackend {
    pub fn new() -> Self {
        Self {
            mount_timeout: crate::config::DEFAULT_MOUNT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_timeouts(mount_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            mount_timeout,
            poll_interval,
        }
    }

    /// Returns true if the FUSE kernel interface is present.
    pub fn is_available(&self) -> bool {
        #[cfg(target_os = "macos")]
        {
            Path::new("/Library/Filesystems/macfuse.fs").exists()
        }
        #[cfg(target_os = "linux")]
        {
            Path::new("/dev/fuse").exists()
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        {
            false
        }
    }

    pub fn unavailable_reason(&self) -> Option<String> {
        if self.is_available() {
            return None;
        }

        #[cfg(target_os = "macos")]
        {
            Some("macFUSE is not installed. Download it from https://osxfuse.github.io/".to_string())
        }
        #[cfg(target_os = "linux")]
        {
            Some("FUSE is not available. Ensure the fuse kernel module is loaded.".to_string())
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux")))]
        {
            Some("FUSE is not supported on this platform.".to_string())
        }
    }

    /// Mounts `fs` at `mountpoint` and waits until the kernel serves it.
    pub fn mount(
        &self,
        fs: SnmpFS,
        mountpoint: &Path,
        config: &MountConfig,
    ) -> Result<FuseMountHandle, MountError> {
        tracing::info!(
            mountpoint = %mountpoint.display(),
            entries = fs.root().cache().len(),
            "Starting FUSE mount"
        );

        if !self.is_available() {
            return Err(MountError::BackendUnavailable(
                self.unavailable_reason().unwrap_or_default(),
            ));
        }

        if !mountpoint.exists() {
            std::fs::create_dir_all(mountpoint)?;
        }

        let options = config.mount_options();
        let session = self.spawn_mount_with_timeout(fs, mountpoint, &options)?;

        let handle = FuseMountHandle {
            session: Some(session),
            mountpoint: mountpoint.to_path_buf(),
        };

        // On failure the handle drops here and tears the session down.
        self.wait_for_mount(mountpoint)?;

        tracing::info!(mountpoint = %mountpoint.display(), "FUSE mount ready");
        Ok(handle)
    }

    /// Mount with spawn_mount2 on a separate thread, so a mount syscall
    /// blocked on a stale mountpoint cannot hang the caller.
    fn spawn_mount_with_timeout(
        &self,
        fs: SnmpFS,
        mountpoint: &Path,
        options: &[MountOption],
    ) -> Result<BackgroundSession, MountError> {
        let mountpoint = mountpoint.to_path_buf();
        let options: Vec<MountOption> = options.to_vec();
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            let result = fuser::spawn_mount2(fs, &mountpoint, &options);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.mount_timeout) {
            Ok(Ok(session)) => Ok(session),
            Ok(Err(e)) => Err(MountError::Mount(e)),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(MountError::Timeout(self.mount_timeout)),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(MountError::Mount(
                std::io::Error::other("Mount thread terminated unexpectedly"),
            )),
        }
    }

    /// Polls until the mountpoint's device differs from its parent's.
    fn wait_for_mount(&self, mount_point: &Path) -> Result<(), MountError> {
        #[cfg(unix)]
        use std::os::unix::fs::MetadataExt;

        let deadline = Instant::now() + self.mount_timeout;
        let parent = mount_point.parent().unwrap_or(Path::new("/"));

        while Instant::now() < deadline {
            #[cfg(unix)]
            {
                if let (Ok(path_meta), Ok(parent_meta)) =
                    (std::fs::metadata(mount_point), std::fs::metadata(parent))
                    && path_meta.dev() != parent_meta.dev()
                {
                    tracing::debug!(
                        "FUSE mount confirmed active at {} (dev {} != parent dev {})",
                        mount_point.display(),
                        path_meta.dev(),
                        parent_meta.dev()
                    );
                    return Ok(());
                }
            }

            #[cfg(not(unix))]
            {
                if mount_point.is_dir() {
                    return Ok(());
                }
            }

            std::thread::sleep(self.poll_interval);
        }

        Err(MountError::Timeout(self.mount_timeout))
    }
}
