//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache.
//!
//! # Tasks
//! - Sweeper: removes expired cache entries at a configured interval

mod sweeper;

pub use sweeper::{start_sweeper, SweeperHandle};
