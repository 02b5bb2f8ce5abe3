//! # Production Chain Cache
//!
//! 生產樹快取與變動追蹤模組

pub mod dirty_tracking;
pub mod resolution_cache;

// Re-export 主要類型
pub use dirty_tracking::DirtyTracker;
pub use resolution_cache::{CacheStats, ChainKey, ResolutionCache};
