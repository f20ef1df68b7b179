//! Cache configuration.

use serde::Deserialize;

const DEFAULT_NAMESPACE: &str = "themeists";

/// Path cache behaviour resolved from the `[options]` and `[cache]` sections.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Prefix applied to the slot key in the shared option store.
    pub namespace: String,
    /// Clear the cached path whenever the panel upload option changes.
    ///
    /// `false` keeps the legacy behaviour, where the old path survives until
    /// an operator clears it.
    pub invalidate_on_upload_change: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            invalidate_on_upload_change: true,
        }
    }
}

impl From<&crate::config::Settings> for CacheConfig {
    fn from(settings: &crate::config::Settings) -> Self {
        Self {
            namespace: settings.options.namespace.clone(),
            invalidate_on_upload_change: settings.cache.invalidate_on_upload_change,
        }
    }
}

impl CacheConfig {
    /// Full option-store key of the path slot.
    pub fn path_key(&self) -> String {
        super::keys::namespaced_key(&self.namespace, super::keys::PATH_CACHE_KEY)
    }
}
