//! Node-level behavior of the mounted tree, driven through an in-memory walk.
//!
//! Run: `cargo test -p snmpfs-fuse --test node_tests`

use std::sync::Arc;
use std::thread;

use snmpfs_core::testing::{varbind, StaticWalk};
use snmpfs_core::{CacheManager, Oid, SnmpValue, FIRST_ENTRY_INODE};
use snmpfs_fuse::{FuseError, NodeKind, SnmpRoot};

fn mounted(walk: &StaticWalk) -> SnmpRoot {
    let cache = Arc::new(CacheManager::new());
    cache.load_walk(walk, &Oid::internet()).unwrap();
    cache.mark_serving();
    SnmpRoot::new(cache)
}

#[test]
fn test_single_text_entry_is_listed_and_readable() {
    let walk = StaticWalk::new(vec![varbind(
        ".1.3.6.1.2.1.1.1.0",
        SnmpValue::OctetString(b"test-system".to_vec()),
    )]);
    let root = mounted(&walk);

    let listing = root.root().read_dir_all();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].name, ".1.3.6.1.2.1.1.1.0");
    assert_eq!(listing[0].kind, NodeKind::RegularFile);

    let file = root.root().lookup(".1.3.6.1.2.1.1.1.0").unwrap();
    assert_eq!(file.read_all().unwrap(), b"test-system\n");
}

#[test]
fn test_time_ticks_render_as_decimal() {
    let walk = StaticWalk::new(vec![varbind(".1.3.6.1.2.1.1.3.0", SnmpValue::TimeTicks(12345))]);
    let root = mounted(&walk);

    let file = root.root().lookup(".1.3.6.1.2.1.1.3.0").unwrap();
    assert_eq!(file.read_all().unwrap(), b"12345\n");
    assert_eq!(file.attr().unwrap().size, 6);
}

#[test]
fn test_unknown_name_is_not_found() {
    let walk = StaticWalk::new(vec![varbind(".1.3.6.1.2.1.1.3.0", SnmpValue::TimeTicks(1))]);
    let root = mounted(&walk);

    let err = root.root().lookup(".9.9.9").unwrap_err();
    assert!(matches!(err, FuseError::NotFound(ref name) if name == ".9.9.9"));
    assert_eq!(err.to_errno(), libc::ENOENT);
}

#[test]
fn test_rewalk_keeps_original_inode() {
    let walk = StaticWalk::new(vec![
        varbind(".1.3.6.1.2.1.1.3.0", SnmpValue::TimeTicks(1)),
        varbind(".1.3.6.1.2.1.1.5.0", SnmpValue::OctetString(b"host".to_vec())),
    ]);
    let cache = Arc::new(CacheManager::new());
    cache.load_walk(&walk, &Oid::internet()).unwrap();
    let before = cache.lookup(".1.3.6.1.2.1.1.3.0").unwrap().inode;

    let summary = cache.load_walk(&walk, &Oid::internet()).unwrap();
    assert_eq!(summary.inserted, 0);
    assert_eq!(summary.skipped, 2);
    assert_eq!(walk.calls(), 2);

    cache.mark_serving();
    let root = SnmpRoot::new(Arc::clone(&cache));
    let listing = root.root().read_dir_all();
    assert_eq!(listing.len(), 2);
    assert_eq!(root.root().lookup(".1.3.6.1.2.1.1.3.0").unwrap().inode(), before);
    assert!(listing.iter().all(|e| e.inode < FIRST_ENTRY_INODE + 2));
}

#[test]
fn test_unrenderable_value_reads_as_diagnostic() {
    let walk = StaticWalk::new(vec![varbind(".1.3.6.1.2.1.1.7.0", SnmpValue::Integer(72))]);
    let root = mounted(&walk);

    let file = root.root().lookup(".1.3.6.1.2.1.1.7.0").unwrap();
    let text = String::from_utf8(file.read_all().unwrap()).unwrap();
    assert!(text.contains(".1.3.6.1.2.1.1.7.0"), "{text}");
    assert!(text.contains("72"), "{text}");
    assert!(text.contains("Integer"), "{text}");
    assert_eq!(file.attr().unwrap().size, text.len() as u64);
}

#[test]
fn test_walk_outside_base_is_excluded() {
    let walk = StaticWalk::new(vec![
        varbind(".1.3.6.1.2.1.1.3.0", SnmpValue::TimeTicks(1)),
        varbind(".1.3.6.1.4.1.8072.1.0", SnmpValue::Counter32(9)),
    ]);
    let cache = Arc::new(CacheManager::new());
    cache
        .load_walk(&walk, &Oid::parse(".1.3.6.1.2.1").unwrap())
        .unwrap();
    let root = SnmpRoot::new(cache);

    assert_eq!(root.root().read_dir_all().len(), 1);
    assert!(root.root().lookup(".1.3.6.1.4.1.8072.1.0").is_err());
}

#[test]
fn test_failed_walk_leaves_empty_tree() {
    let walk = StaticWalk::failing("agent unreachable");
    let cache = Arc::new(CacheManager::new());
    assert!(cache.load_walk(&walk, &Oid::internet()).is_err());

    let root = SnmpRoot::new(cache);
    assert!(root.root().read_dir_all().is_empty());
}

#[test]
fn test_concurrent_readers_see_consistent_entries() {
    let varbinds = (0..200u32)
        .map(|i| varbind(&format!(".1.3.6.1.2.1.2.2.1.10.{i}"), SnmpValue::Counter32(i)))
        .collect();
    let root = mounted(&StaticWalk::new(varbinds));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let root = root.clone();
            thread::spawn(move || {
                for entry in root.root().read_dir_all() {
                    let file = root.root().lookup(&entry.name).unwrap();
                    assert_eq!(file.inode(), entry.inode);
                    let index = entry.name.rsplit('.').next().unwrap();
                    assert_eq!(file.read_all().unwrap(), format!("{index}\n").into_bytes());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
