//! Local key-value storage accessor.
//!
//! # Responsibility
//! - Provide generic get/set over a single-device key-value store.
//! - Keep JSON (de)serialization at one boundary.
//!
//! # Invariants
//! - Values are stored as JSON text; malformed values surface as errors.
//! - Writes to one key are last-write-wins.

pub mod kv_store;

pub use kv_store::{
    get_json, set_json, KvStore, SqliteKvStore, StorageError, StorageResult,
};
