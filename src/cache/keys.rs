//! Option-store key definitions.

/// Fixed key of the favicon path slot, before namespacing.
pub const PATH_CACHE_KEY: &str = "favicon_path";

/// Prefix `key` with `namespace` and an underscore; an empty namespace leaves it bare.
pub fn namespaced_key(namespace: &str, key: &str) -> String {
    let namespace = namespace.trim().trim_end_matches('_');
    if namespace.is_empty() {
        key.to_string()
    } else {
        format!("{namespace}_{key}")
    }
}
