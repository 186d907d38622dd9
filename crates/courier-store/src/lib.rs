//! Courier Expiring Store
//!
//! This crate provides the key-value store abstraction the response cache
//! writes to, along with an in-memory implementation that enforces
//! absolute expiry.

pub mod backend;
pub mod error;
pub mod memory;

pub use backend::ExpiringStore;
pub use error::StoreError;
pub use memory::{MemoryStore, spawn_purge_task};
