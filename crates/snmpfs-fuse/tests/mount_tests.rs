//! End-to-end tests through a real kernel mount.
//!
//! Run: `cargo test -p snmpfs-fuse --features fuse-tests --test mount_tests`

#![cfg(all(unix, feature = "fuse-tests"))]

mod common;

use std::fs::OpenOptions;
use std::os::unix::fs::PermissionsExt;

use common::try_mount;
use snmpfs_core::testing::varbind;
use snmpfs_core::SnmpValue;

fn system_group() -> Vec<snmpfs_core::VarBind> {
    vec![
        varbind(
            ".1.3.6.1.2.1.1.1.0",
            SnmpValue::OctetString(b"test-system".to_vec()),
        ),
        varbind(".1.3.6.1.2.1.1.3.0", SnmpValue::TimeTicks(12345)),
        varbind(".1.3.6.1.2.1.1.7.0", SnmpValue::Integer(72)),
    ]
}

#[test]
fn test_listing_matches_walk() {
    let Some(mount) = try_mount(system_group()) else {
        return;
    };
    assert_eq!(
        mount.list().unwrap(),
        vec![
            ".1.3.6.1.2.1.1.1.0".to_string(),
            ".1.3.6.1.2.1.1.3.0".to_string(),
            ".1.3.6.1.2.1.1.7.0".to_string(),
        ]
    );
}

#[test]
fn test_read_rendered_values() {
    let Some(mount) = try_mount(system_group()) else {
        return;
    };
    assert_eq!(mount.read(".1.3.6.1.2.1.1.1.0").unwrap(), b"test-system\n");
    assert_eq!(mount.read(".1.3.6.1.2.1.1.3.0").unwrap(), b"12345\n");

    let diagnostic = mount.read(".1.3.6.1.2.1.1.7.0").unwrap();
    assert!(diagnostic.starts_with(b"error unknown type"));
}

#[test]
fn test_file_metadata() {
    let Some(mount) = try_mount(system_group()) else {
        return;
    };
    let meta = std::fs::metadata(mount.path(".1.3.6.1.2.1.1.3.0")).unwrap();
    assert!(meta.is_file());
    assert_eq!(meta.len(), 6);
    assert_eq!(meta.permissions().mode() & 0o777, 0o444);

    let meta = std::fs::metadata(mount.root()).unwrap();
    assert!(meta.is_dir());
    assert_eq!(meta.permissions().mode() & 0o777, 0o555);
}

#[test]
fn test_missing_entry() {
    let Some(mount) = try_mount(system_group()) else {
        return;
    };
    let err = std::fs::metadata(mount.path(".9.9.9")).unwrap_err();
    assert_eq!(err.raw_os_error(), Some(libc::ENOENT));
}

#[test]
fn test_writes_are_rejected() {
    let Some(mount) = try_mount(system_group()) else {
        return;
    };
    let err = OpenOptions::new()
        .write(true)
        .open(mount.path(".1.3.6.1.2.1.1.1.0"))
        .unwrap_err();
    assert_eq!(err.raw_os_error(), Some(libc::EROFS));

    let err = std::fs::write(mount.path("new-file"), b"x").unwrap_err();
    assert_eq!(err.raw_os_error(), Some(libc::EROFS));

    let err = std::fs::create_dir(mount.path("subdir")).unwrap_err();
    assert_eq!(err.raw_os_error(), Some(libc::EROFS));

    assert_eq!(mount.read(".1.3.6.1.2.1.1.1.0").unwrap(), b"test-system\n");
}

#[test]
fn test_empty_walk_mounts_empty_directory() {
    let Some(mount) = try_mount(Vec::new()) else {
        return;
    };
    assert!(mount.list().unwrap().is_empty());
}
