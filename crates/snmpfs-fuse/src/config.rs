//! Mount configuration for the FUSE filesystem.

use std::time::Duration;

/// Default attribute/entry TTL handed to the kernel.
///
/// The cache never changes after the startup walk, so entries can be
/// cached by the kernel for a long time.
pub const DEFAULT_ATTR_TTL: Duration = Duration::from_secs(60);

/// Default time to wait for the mount to become ready.
pub const DEFAULT_MOUNT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration options for mounting the filesystem.
#[derive(Debug, Clone)]
pub struct MountConfig {
    /// Time-to-live for attributes and entries returned to the kernel.
    pub attr_ttl: Duration,

    /// How long to wait for the mount to attach and become ready.
    pub mount_timeout: Duration,

    /// Filesystem name shown in the mount table.
    pub fs_name: String,

    /// Filesystem subtype (`fuse.<subtype>`).
    pub subtype: String,

    /// Volume name (macOS Finder).
    pub volume_name: String,

    /// Unmount automatically when the process exits.
    pub auto_unmount: bool,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            attr_ttl: DEFAULT_ATTR_TTL,
            mount_timeout: DEFAULT_MOUNT_TIMEOUT,
            fs_name: "fuse-snmp".to_string(),
            subtype: "snmpfs".to_string(),
            volume_name: "Fuse SNMP".to_string(),
            auto_unmount: true,
        }
    }
}

impl MountConfig {
    /// Sets the attribute TTL.
    #[must_use]
    pub fn attr_ttl(mut self, ttl: Duration) -> Self {
        self.attr_ttl = ttl;
        self
    }

    /// Sets the mount readiness timeout.
    #[must_use]
    pub fn mount_timeout(mut self, timeout: Duration) -> Self {
        self.mount_timeout = timeout;
        self
    }

    /// Sets the filesystem name.
    #[must_use]
    pub fn fs_name(mut self, name: impl Into<String>) -> Self {
        self.fs_name = name.into();
        self
    }

    /// Sets whether to unmount on process exit.
    #[must_use]
    pub fn auto_unmount(mut self, enabled: bool) -> Self {
        self.auto_unmount = enabled;
        self
    }

    /// Builds the fuser mount options. The mount is always read-only.
    pub fn mount_options(&self) -> Vec<fuser::MountOption> {
        let mut options = vec![
            fuser::MountOption::FSName(self.fs_name.clone()),
            fuser::MountOption::Subtype(self.subtype.clone()),
            fuser::MountOption::RO,
            fuser::MountOption::DefaultPermissions,
        ];

        if self.auto_unmount {
            options.push(fuser::MountOption::AutoUnmount);
        }

        #[cfg(target_os = "macos")]
        {
            options.push(fuser::MountOption::CUSTOM(format!("volname={}", self.volume_name)));
            options.push(fuser::MountOption::CUSTOM("local".to_string()));
        }

        options
    }
}
