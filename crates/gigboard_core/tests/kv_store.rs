use gigboard_core::{get_json, set_json, KvStore, SqliteKvStore};
use serde_json::json;
use std::sync::Arc;
use std::thread;

#[test]
fn set_overwrites_previous_value() {
    let store = SqliteKvStore::open_in_memory().expect("open in-memory store");
    store.set_raw("theme", "\"light\"").expect("write raw value");
    store.set_raw("theme", "\"dark\"").expect("write raw value");

    let theme: Option<String> = get_json(&store, "theme").expect("read json value");
    assert_eq!(theme.as_deref(), Some("dark"));
}

#[test]
fn remove_reports_whether_key_existed() {
    let store = SqliteKvStore::open_in_memory().expect("open in-memory store");
    set_json(&store, "session", &json!({ "user": "ana" })).expect("write json value");

    assert!(store.remove("session").expect("remove key"));
    assert!(!store.remove("session").expect("remove key"));
    assert!(store.get_raw("session").expect("read raw value").is_none());
}

#[test]
fn keys_with_prefix_is_sorted_and_exact() {
    let store = SqliteKvStore::open_in_memory().expect("open in-memory store");
    for key in ["project:b", "project:a", "profile:a", "projects"] {
        store.set_raw(key, "null").expect("write raw value");
    }

    let keys = store.keys_with_prefix("project:").expect("list keys");
    assert_eq!(keys, vec!["project:a".to_string(), "project:b".to_string()]);
}

#[test]
fn file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("kv.db");

    {
        let store = SqliteKvStore::open(&path).expect("open store");
        set_json(&store, "counter", &41u32).expect("write json value");
    }

    let store = SqliteKvStore::open(&path).expect("open store");
    let counter: Option<u32> = get_json(&store, "counter").expect("read json value");
    assert_eq!(counter, Some(41));
}

#[test]
fn shared_store_accepts_writes_from_threads() {
    let store = Arc::new(SqliteKvStore::open_in_memory().expect("open in-memory store"));

    let handles: Vec<_> = (0..4)
        .map(|index| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                set_json(&store, &format!("slot:{index}"), &index).expect("write json value");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("join writer thread");
    }

    assert_eq!(store.keys_with_prefix("slot:").expect("list keys").len(), 4);
}
