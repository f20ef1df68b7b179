//! Priority-ordered favicon resolution.
//!
//! Levels, first match wins:
//! 1. the attachment uploaded through the settings panel (when the panel exists),
//! 2. `favicon.png`, then `favicon.ico`, in the site root,
//! 3. the bundled default asset.
//!
//! Collaborator failures are logged and treated as "not found" at that level,
//! so resolution always yields a path.

use std::fmt;
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::application::repos::{AttachmentStore, OptionStore, SiteRoot};
use crate::domain::error::DomainError;
use crate::domain::favicon::{
    BaseUrl, FAVICON_IMAGE_OPTION, FaviconSource, ImageSize, ROOT_CANDIDATES, ResolvedPath,
};
use crate::domain::types::SourceKind;

const SOURCE: &str = "application::resolver";

/// Transform applied to the resolved path before it is cached or returned.
pub type PathFilter = Arc<dyn Fn(String) -> String + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    has_upload_panel: bool,
    site_url: BaseUrl,
    default_asset: ResolvedPath,
}

impl ResolverConfig {
    /// `has_upload_panel` says whether the host exposes the favicon upload option;
    /// `site_url` addresses root files; `default_asset_url` is the bundled image.
    pub fn new(
        has_upload_panel: bool,
        site_url: impl Into<String>,
        default_asset_url: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let site_url = BaseUrl::parse(&site_url.into())
            .ok_or_else(|| DomainError::validation("site url must be an absolute url"))?;
        let default_asset = ResolvedPath::new(default_asset_url.into(), SourceKind::PluginDefault)
            .ok_or_else(|| DomainError::validation("default asset url must not be empty"))?;
        Ok(Self {
            has_upload_panel,
            site_url,
            default_asset,
        })
    }
}

#[derive(Clone)]
pub struct FaviconResolver {
    config: ResolverConfig,
    options: Arc<dyn OptionStore>,
    attachments: Arc<dyn AttachmentStore>,
    site_root: Arc<dyn SiteRoot>,
    filter: Option<PathFilter>,
}

impl fmt::Debug for FaviconResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaviconResolver")
            .field("config", &self.config)
            .field("filter", &self.filter.is_some())
            .finish_non_exhaustive()
    }
}

impl FaviconResolver {
    pub fn new(
        config: ResolverConfig,
        options: Arc<dyn OptionStore>,
        attachments: Arc<dyn AttachmentStore>,
        site_root: Arc<dyn SiteRoot>,
    ) -> Self {
        Self {
            config,
            options,
            attachments,
            site_root,
            filter: None,
        }
    }

    /// Register the path filter, replacing any previous one.
    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Pick the favicon to serve now. Never fails.
    pub async fn resolve(&self) -> ResolvedPath {
        let source = self.select_source().await;
        let kind = source.kind();
        counter!("icona_resolve_total", "source" => kind.as_str()).increment(1);

        let selected = source.into_path();
        let url = match self.filter.as_ref() {
            Some(filter) => {
                let filtered = filter(selected.clone());
                if filtered.trim().is_empty() {
                    warn!(
                        target = SOURCE,
                        op = "resolve",
                        result = "filter_discarded",
                        source = %kind,
                        "Path filter returned an empty path; keeping the resolved one"
                    );
                    selected
                } else {
                    filtered
                }
            }
            None => selected,
        };

        debug!(
            target = SOURCE,
            op = "resolve",
            source = %kind,
            url = %url,
            "Resolved favicon"
        );

        ResolvedPath::new(url, kind).unwrap_or_else(|| self.config.default_asset.clone())
    }

    async fn select_source(&self) -> FaviconSource {
        if self.config.has_upload_panel
            && let Some(url) = self.panel_upload().await
        {
            return FaviconSource::PanelUpload(url);
        }

        if let Some(name) = self.root_file().await {
            return FaviconSource::RootFile(self.config.site_url.join(name));
        }

        FaviconSource::PluginDefault(self.config.default_asset.url().to_string())
    }

    async fn panel_upload(&self) -> Option<String> {
        let attachment_id = match self.options.get_option(FAVICON_IMAGE_OPTION).await {
            Ok(Some(value)) if !value.trim().is_empty() => value.trim().to_string(),
            Ok(_) => return None,
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "panel_upload",
                    result = "option_store_error",
                    error = %err,
                    "Failed to read favicon upload option; falling through"
                );
                return None;
            }
        };

        match self
            .attachments
            .image_src(&attachment_id, ImageSize::FAVICON)
            .await
        {
            Ok(Some(image)) if !image.url.trim().is_empty() => Some(image.url),
            Ok(_) => {
                warn!(
                    target = SOURCE,
                    op = "panel_upload",
                    result = "attachment_missing",
                    attachment_id = %attachment_id,
                    "Configured favicon attachment not found; falling through"
                );
                None
            }
            Err(err) => {
                warn!(
                    target = SOURCE,
                    op = "panel_upload",
                    result = "attachment_error",
                    attachment_id = %attachment_id,
                    error = %err,
                    "Failed to resolve favicon attachment; falling through"
                );
                None
            }
        }
    }

    async fn root_file(&self) -> Option<&'static str> {
        for name in ROOT_CANDIDATES {
            match self.site_root.exists(name).await {
                Ok(true) => return Some(name),
                Ok(false) => {}
                Err(err) => warn!(
                    target = SOURCE,
                    op = "root_file",
                    result = "probe_error",
                    file = name,
                    error = %err,
                    "Failed to probe site root; treating as missing"
                ),
            }
        }
        None
    }
}
