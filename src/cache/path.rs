//! The persisted favicon path slot.

use std::fmt;
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::application::repos::{OptionStore, RepoError};

use super::config::CacheConfig;

const SOURCE: &str = "cache::path";

/// Single-slot cache for the last resolved favicon path.
///
/// Reads and writes never fail from the caller's point of view: store errors are
/// logged and surface as a miss (on `get`) or a skipped write (on `set`). Only
/// the administrative `clear` reports errors.
#[derive(Clone)]
pub struct PathCache {
    store: Arc<dyn OptionStore>,
    key: String,
}

impl fmt::Debug for PathCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathCache")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl PathCache {
    pub fn new(store: Arc<dyn OptionStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            key: config.path_key(),
        }
    }

    /// Option-store key backing this slot.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Cached path, if one is stored and non-empty.
    pub async fn get(&self) -> Option<String> {
        match self.store.get_option(&self.key).await {
            Ok(Some(path)) if !path.trim().is_empty() => {
                counter!("icona_path_cache_hit_total").increment(1);
                Some(path)
            }
            Ok(_) => {
                counter!("icona_path_cache_miss_total").increment(1);
                None
            }
            Err(err) => {
                counter!("icona_path_cache_miss_total").increment(1);
                warn!(
                    target = SOURCE,
                    op = "get",
                    key = %self.key,
                    result = "store_error",
                    error = %err,
                    "Failed to read cached favicon path; treating as miss"
                );
                None
            }
        }
    }

    /// Overwrite the cached path.
    pub async fn set(&self, path: &str) {
        match self.store.update_option(&self.key, path).await {
            Ok(()) => debug!(
                target = SOURCE,
                op = "set",
                key = %self.key,
                path,
                "Cached favicon path"
            ),
            Err(err) => warn!(
                target = SOURCE,
                op = "set",
                key = %self.key,
                result = "store_error",
                error = %err,
                "Failed to cache favicon path"
            ),
        }
    }

    /// Remove the cached path.
    pub async fn clear(&self) -> Result<(), RepoError> {
        self.store.delete_option(&self.key).await?;
        debug!(
            target = SOURCE,
            op = "clear",
            key = %self.key,
            "Cleared cached favicon path"
        );
        Ok(())
    }
}
