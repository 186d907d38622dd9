//! Response cache module

mod handler;
pub mod policy;
mod snapshot;

pub use handler::{CacheStats, CachingHandler};
pub use policy::CacheControl;
pub use snapshot::{Snapshot, SnapshotBody};
