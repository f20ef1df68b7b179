//! Favicon path cache.
//!
//! A single persisted slot in the host option store that memoizes the last
//! resolved favicon path. The slot never expires; only an explicit clear
//! removes it.
//!
//! ## Configuration
//!
//! ```toml
//! [options]
//! namespace = "themeists"   # slot key becomes `themeists_favicon_path`
//!
//! [cache]
//! invalidate_on_upload_change = true
//! ```

mod config;
mod keys;
mod path;

pub use config::CacheConfig;
pub use keys::{PATH_CACHE_KEY, namespaced_key};
pub use path::PathCache;
