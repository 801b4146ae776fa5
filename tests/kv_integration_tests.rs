//! End-to-end tests for the KV service over real redb files.
//!
//! Run with:
//! ```bash
//! cargo test --test kv_integration_tests
//! ```

use meshkv::config::KvConfig;
use meshkv::constants::{INDEX_TABLE, VALUES_TABLE};
use meshkv::kv::{KvService, OrderedStore, RedbStore};
use meshkv::{Error, digest};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_persistence_across_reopens() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let config = KvConfig::in_dir(tmp.path());

    {
        let kv = KvService::open(&config).expect("Failed to open store");
        kv.put("ec:1", &json!({"amount": 10})).unwrap();
        kv.put("ec:2", &json!({"amount": 20})).unwrap();
        kv.put("other:1", "x").unwrap();
        kv.close().unwrap();
    }

    let kv = KvService::open(&config).expect("Failed to reopen store");
    assert_eq!(kv.cache_len(), 0, "Cache must start empty after restart");
    assert_eq!(kv.get_value("ec:2").unwrap(), json!({"amount": 20}));

    let scanned = kv.iterate("ec:").unwrap();
    assert_eq!(
        scanned,
        vec![
            ("ec:1".to_string(), json!({"amount": 10})),
            ("ec:2".to_string(), json!({"amount": 20})),
        ]
    );
}

#[test]
fn test_drop_without_close_persists() {
    let tmp = TempDir::new().unwrap();
    let config = KvConfig::in_dir(tmp.path());

    {
        let kv = KvService::open(&config).unwrap();
        kv.put("k", "v").unwrap();
    }

    let kv = KvService::open(&config).unwrap();
    assert_eq!(kv.get::<String>("k").unwrap(), "v");
}

#[test]
fn test_on_disk_layout() {
    let tmp = TempDir::new().unwrap();
    let config = KvConfig::in_dir(tmp.path());

    {
        let kv = KvService::open(&config).unwrap();
        kv.put("user:1", "alice").unwrap();
        kv.close().unwrap();
    }

    let key_digest = digest::digest("user:1");

    let index = RedbStore::open(&config.index_path, INDEX_TABLE).unwrap();
    assert_eq!(
        index.get(b"user:1").unwrap(),
        Some(key_digest.as_bytes().to_vec()),
        "Index maps the plain key to the raw digest"
    );
    drop(index);

    let primary = RedbStore::open(&config.path, VALUES_TABLE).unwrap();
    assert_eq!(
        primary.get(key_digest.as_bytes()).unwrap(),
        Some(b"\"alice\"".to_vec()),
        "Primary maps the digest to the JSON payload"
    );
    assert_eq!(primary.get(b"user:1").unwrap(), None);
}

#[test]
fn test_second_open_of_same_files_fails() {
    let tmp = TempDir::new().unwrap();
    let config = KvConfig::in_dir(tmp.path());

    let _kv = KvService::open(&config).unwrap();
    let err = KvService::open(&config).err().expect("Second open must fail");
    assert!(matches!(err, Error::Open { .. }));
}

#[test]
fn test_config_file_round_trip() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("meshkv.toml");
    let data = tmp.path().join("data");
    std::fs::write(
        &config_path,
        format!(
            "path = {:?}\nindex_path = {:?}\ncache_size = 2\n",
            data.join("p.redb"),
            data.join("i.redb")
        ),
    )
    .unwrap();

    let config = KvConfig::load_from(&config_path).unwrap();
    let kv = KvService::open(&config).unwrap();
    for i in 0..5 {
        kv.put(&format!("k{i}"), &i).unwrap();
    }
    assert_eq!(kv.cache_len(), 2);
    assert!(data.join("p.redb").exists());
    assert!(data.join("i.redb").exists());
}

#[test]
fn test_reconcile_on_clean_reopen() {
    let tmp = TempDir::new().unwrap();
    let config = KvConfig::in_dir(tmp.path());

    let kv = KvService::open(&config).unwrap();
    for i in 0..10 {
        kv.put(&format!("item:{i}"), &i).unwrap();
    }
    let report = kv.reconcile().unwrap();
    assert!(report.is_clean());
    assert_eq!(report.scanned, 10);
}

// =============================================================================
// Async wrappers
// =============================================================================

#[tokio::test]
async fn test_async_round_trip() {
    let tmp = TempDir::new().unwrap();
    let kv = KvService::open(&KvConfig::in_dir(tmp.path())).unwrap();

    kv.put_async("ec:1".to_string(), json!({"state": "open"}))
        .await
        .unwrap();
    kv.put_async("ec:2".to_string(), "closed".to_string())
        .await
        .unwrap();

    assert_eq!(
        kv.get_async("ec:1".to_string()).await.unwrap(),
        json!({"state": "open"})
    );
    assert_eq!(kv.iterate_async("ec:".to_string()).await.unwrap().len(), 2);
    assert!(kv.reconcile_async().await.unwrap().is_clean());
}

#[tokio::test]
async fn test_async_errors_are_typed() {
    let kv = KvService::memory();

    let err = kv.get_async("missing".to_string()).await.unwrap_err();
    assert!(err.is_not_found());

    let err = kv
        .put_async(String::new(), "v".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmptyKey));
}
