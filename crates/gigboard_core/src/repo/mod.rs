//! Repository layer over the local key-value store.
//!
//! # Responsibility
//! - Map hierarchy trees to storage keys.
//! - Keep JSON/storage details out of the service layer.
//!
//! # Invariants
//! - Writes and reads both enforce `Project::validate()`.
//! - One project tree lives under exactly one key.

pub mod project_repo;
