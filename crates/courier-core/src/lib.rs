//! Courier Core
//!
//! This crate provides the transparent response cache that sits in the
//! outbound request path: cacheability policy, immutable response
//! snapshots, and the `CachingHandler` layer itself.

pub mod cache;
pub mod error;

pub use cache::{CacheControl, CacheStats, CachingHandler, Snapshot};
pub use error::CoreError;
