//! Cache-first favicon lookup and head markup.

use serde::Serialize;
use tracing::{info, warn};

use crate::application::repos::RepoError;
use crate::application::resolver::FaviconResolver;
use crate::cache::PathCache;
use crate::domain::types::{HeadSlot, SourceKind};
use crate::presentation::views::render_favicon_link;

const SOURCE: &str = "application::favicon";

/// Diagnostic view of a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaviconLookup {
    pub path: String,
    pub cached: bool,
    /// Level that produced the path; unknown on a cache hit.
    pub source: Option<SourceKind>,
}

#[derive(Clone, Debug)]
pub struct FaviconService {
    resolver: FaviconResolver,
    cache: PathCache,
}

impl FaviconService {
    pub fn new(resolver: FaviconResolver, cache: PathCache) -> Self {
        Self { resolver, cache }
    }

    /// The favicon path to embed now.
    pub async fn current_path(&self) -> String {
        self.lookup().await.path
    }

    pub async fn lookup(&self) -> FaviconLookup {
        if let Some(path) = self.cache.get().await {
            return FaviconLookup {
                path,
                cached: true,
                source: None,
            };
        }
        self.resolve_and_store().await
    }

    /// Re-run resolution and overwrite the cached path.
    pub async fn refresh(&self) -> FaviconLookup {
        let lookup = self.resolve_and_store().await;
        info!(
            target = SOURCE,
            op = "refresh",
            path = %lookup.path,
            source = ?lookup.source,
            "Favicon path refreshed"
        );
        lookup
    }

    pub async fn clear_cache(&self) -> Result<(), RepoError> {
        self.cache.clear().await?;
        info!(target = SOURCE, op = "clear_cache", "Favicon path cache cleared");
        Ok(())
    }

    /// Link tag for `slot`. Rendering failures yield an empty fragment.
    pub async fn head_markup(&self, slot: HeadSlot) -> String {
        let path = self.current_path().await;
        match render_favicon_link(&path, slot) {
            Ok(html) => html,
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "head_markup",
                    slot = slot.as_str(),
                    source_module = err.source,
                    error = %err.error,
                    "Failed to render favicon markup"
                );
                String::new()
            }
        }
    }

    async fn resolve_and_store(&self) -> FaviconLookup {
        let resolved = self.resolver.resolve().await;
        self.cache.set(resolved.url()).await;
        let source = resolved.source();
        FaviconLookup {
            path: resolved.into_url(),
            cached: false,
            source: Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::application::repos::OptionStore;
    use crate::application::resolver::ResolverConfig;
    use crate::application::testing::{FakeAttachments, FakeSiteRoot};
    use crate::cache::CacheConfig;
    use crate::domain::favicon::FAVICON_IMAGE_OPTION;
    use crate::infra::options::MemoryOptionStore;

    const SITE_URL: &str = "https://example.com";
    const DEFAULT_URL: &str = "https://example.com/static/icona/favicon.png";

    fn service(store: Arc<MemoryOptionStore>, root: FakeSiteRoot) -> FaviconService {
        let config = ResolverConfig::new(true, SITE_URL, DEFAULT_URL).expect("config");
        let resolver = FaviconResolver::new(
            config,
            store.clone(),
            Arc::new(FakeAttachments::default().with_image("A", "https://cdn/a-16x16.png")),
            Arc::new(root),
        );
        FaviconService::new(resolver, PathCache::new(store, &CacheConfig::default()))
    }

    #[tokio::test]
    async fn miss_resolves_and_populates_cache() {
        let store = Arc::new(MemoryOptionStore::new());
        let service = service(store.clone(), FakeSiteRoot::default().with_file("favicon.png"));

        let lookup = service.lookup().await;
        assert_eq!(lookup.path, "https://example.com/favicon.png");
        assert!(!lookup.cached);
        assert_eq!(lookup.source, Some(SourceKind::RootFile));
        assert_eq!(
            store
                .get_option("themeists_favicon_path")
                .await
                .unwrap()
                .as_deref(),
            Some("https://example.com/favicon.png")
        );

        let second = service.lookup().await;
        assert!(second.cached);
        assert_eq!(second.path, lookup.path);
        assert_eq!(second.source, None);
    }

    #[tokio::test]
    async fn cached_path_survives_upload_change_until_cleared() {
        let store = Arc::new(MemoryOptionStore::new());
        let service = service(store.clone(), FakeSiteRoot::default());

        assert_eq!(service.current_path().await, DEFAULT_URL);

        store.update_option(FAVICON_IMAGE_OPTION, "A").await.unwrap();
        assert_eq!(service.current_path().await, DEFAULT_URL);

        service.clear_cache().await.expect("clear");
        assert_eq!(service.current_path().await, "https://cdn/a-16x16.png");
    }

    #[tokio::test]
    async fn refresh_overwrites_cache() {
        let store = Arc::new(MemoryOptionStore::new());
        let service = service(store.clone(), FakeSiteRoot::default());
        service.current_path().await;

        store.update_option(FAVICON_IMAGE_OPTION, "A").await.unwrap();
        let lookup = service.refresh().await;

        assert_eq!(lookup.source, Some(SourceKind::PanelUpload));
        assert_eq!(service.current_path().await, "https://cdn/a-16x16.png");
    }

    #[tokio::test]
    async fn filtered_path_is_cached_and_hits_skip_the_filter() {
        let store = Arc::new(MemoryOptionStore::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let config = ResolverConfig::new(true, SITE_URL, DEFAULT_URL).expect("config");
        let resolver = FaviconResolver::new(
            config,
            store.clone(),
            Arc::new(FakeAttachments::default()),
            Arc::new(FakeSiteRoot::default()),
        )
        .with_filter(Arc::new(move |path: String| {
            counted.fetch_add(1, Ordering::SeqCst);
            format!("{path}?v=2")
        }));
        let service = FaviconService::new(
            resolver,
            PathCache::new(store.clone(), &CacheConfig::default()),
        );
        let filtered = format!("{DEFAULT_URL}?v=2");

        assert_eq!(service.current_path().await, filtered);
        assert_eq!(
            store
                .get_option("themeists_favicon_path")
                .await
                .unwrap()
                .as_deref(),
            Some(filtered.as_str())
        );

        let second = service.lookup().await;
        assert!(second.cached);
        assert_eq!(second.path, filtered);
        assert_eq!(service.current_path().await, filtered);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        service.refresh().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(service.current_path().await, filtered);
    }

    #[tokio::test]
    async fn head_markup_embeds_current_path() {
        let store = Arc::new(MemoryOptionStore::new());
        let service = service(store, FakeSiteRoot::default().with_file("favicon.ico"));

        let public = service.head_markup(HeadSlot::Public).await;
        let admin = service.head_markup(HeadSlot::Admin).await;

        assert_eq!(
            public,
            r#"<link rel="Shortcut Icon" type="image/png" href="https://example.com/favicon.ico" />"#
        );
        assert_eq!(public, admin);
    }
}
