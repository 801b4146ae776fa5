//! Property-based tests for KV service invariants.
//!
//! - Any non-empty pair round-trips through `put` / `get`
//! - The last write for a key wins and leaves exactly one index entry
//! - Prefix scans return exactly the matching keys, sorted
//! - The cache never exceeds its capacity and never changes results

use super::*;
use proptest::prelude::*;
use std::collections::BTreeMap;

// ============================================================================
// Test Strategies - Input Generation
// ============================================================================

/// Short keys from a small alphabet so prefixes collide often.
fn key() -> impl Strategy<Value = String> {
    "[a-c:]{1,6}"
}

/// Non-empty string values.
fn value() -> impl Strategy<Value = String> {
    ".{1,32}"
}

fn writes() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((key(), value()), 1..40)
}

proptest! {
    #[test]
    fn put_then_get_round_trips(k in key(), v in value()) {
        let kv = KvService::memory();
        kv.put(&k, &v).unwrap();
        prop_assert_eq!(kv.get::<String>(&k).unwrap(), v);
    }

    #[test]
    fn last_write_wins(ops in writes()) {
        let index = MemoryStore::new();
        let kv = KvService::with_stores(MemoryStore::new(), index.clone(), 4);
        let mut model = BTreeMap::new();

        for (k, v) in &ops {
            kv.put(k, v).unwrap();
            model.insert(k.clone(), v.clone());
        }

        prop_assert_eq!(index.len().unwrap(), model.len());
        for (k, v) in &model {
            prop_assert_eq!(&kv.get::<String>(k).unwrap(), v);
        }
    }

    #[test]
    fn prefix_scan_matches_model(ops in writes(), prefix in "[a-c:]{0,3}") {
        let kv = KvService::memory();
        let mut model = BTreeMap::new();

        for (k, v) in &ops {
            kv.put(k, v).unwrap();
            model.insert(k.clone(), v.clone());
        }

        let expected: Vec<(String, serde_json::Value)> = model
            .into_iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(k, v)| (k, serde_json::Value::String(v)))
            .collect();

        prop_assert_eq!(kv.iterate(&prefix).unwrap(), expected);
    }

    #[test]
    fn cache_size_does_not_change_results(ops in writes(), capacity in 0usize..8) {
        let small = KvService::with_stores(MemoryStore::new(), MemoryStore::new(), capacity);
        let large = KvService::with_stores(MemoryStore::new(), MemoryStore::new(), 1024);

        for (k, v) in &ops {
            small.put(k, v).unwrap();
            large.put(k, v).unwrap();
            prop_assert!(small.cache_len() <= capacity);
        }

        for (k, _) in &ops {
            prop_assert_eq!(
                small.get::<String>(k).unwrap(),
                large.get::<String>(k).unwrap()
            );
            prop_assert!(small.cache_len() <= capacity);
        }
        prop_assert_eq!(small.iterate("").unwrap(), large.iterate("").unwrap());
    }
}
