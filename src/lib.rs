//! Cachete - An in-process cache with tag invalidation and memoization
//!
//! Stores arbitrary values under string keys with fixed-duration or
//! tag-based expiration, sweeps expired entries in the background, and
//! memoizes function calls keyed by callable identity and arguments.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheStats, Expiration};
pub use config::{Config, ExpirationConfig};
pub use error::{CacheError, MemoizeError};
pub use tasks::{start_sweeper, SweeperHandle};
