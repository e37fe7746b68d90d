//! Background Tasks Module
//!
//! Contains background tasks that run periodically for the lifetime of the
//! cache that owns them.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired cache entries at configured intervals

mod cleanup;

pub use cleanup::{spawn_cleanup_task, DEFAULT_CLEANUP_INTERVAL};
