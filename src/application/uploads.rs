//! The panel upload option and its effect on the path cache.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::application::repos::{AttachmentStore, OptionStore, RepoError};
use crate::cache::PathCache;
use crate::domain::favicon::{FAVICON_IMAGE_OPTION, ImageSize};

const SOURCE: &str = "application::uploads";

#[derive(Debug, Error)]
pub enum UploadSettingsError {
    #[error("the favicon upload panel is not enabled for this site")]
    PanelDisabled,
    #[error("{0}")]
    ConstraintViolation(&'static str),
    #[error("attachment `{0}` not found")]
    UnknownAttachment(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct FaviconUploadService {
    options: Arc<dyn OptionStore>,
    attachments: Arc<dyn AttachmentStore>,
    cache: PathCache,
    has_upload_panel: bool,
    invalidate_on_change: bool,
}

impl FaviconUploadService {
    pub fn new(
        options: Arc<dyn OptionStore>,
        attachments: Arc<dyn AttachmentStore>,
        cache: PathCache,
        has_upload_panel: bool,
        invalidate_on_change: bool,
    ) -> Self {
        Self {
            options,
            attachments,
            cache,
            has_upload_panel,
            invalidate_on_change,
        }
    }

    /// Currently configured attachment id, if any.
    pub async fn current(&self) -> Result<Option<String>, UploadSettingsError> {
        let value = self.options.get_option(FAVICON_IMAGE_OPTION).await?;
        Ok(value.filter(|id| !id.trim().is_empty()))
    }

    pub async fn set_upload(&self, attachment_id: &str) -> Result<(), UploadSettingsError> {
        self.ensure_panel()?;
        let attachment_id = attachment_id.trim();
        if attachment_id.is_empty() {
            return Err(UploadSettingsError::ConstraintViolation(
                "attachment_id must not be empty",
            ));
        }

        if self
            .attachments
            .image_src(attachment_id, ImageSize::FAVICON)
            .await?
            .is_none()
        {
            return Err(UploadSettingsError::UnknownAttachment(
                attachment_id.to_string(),
            ));
        }

        // The original image still resolves if the derived size cannot be produced.
        if let Err(err) = self
            .attachments
            .generate_size(attachment_id, ImageSize::FAVICON)
            .await
        {
            warn!(
                target = SOURCE,
                op = "set_upload",
                result = "resize_failed",
                attachment_id,
                error = %err,
                "Failed to derive favicon size; the original image will be served"
            );
        }

        self.options
            .update_option(FAVICON_IMAGE_OPTION, attachment_id)
            .await?;
        info!(
            target = SOURCE,
            op = "set_upload",
            attachment_id,
            "Favicon upload updated"
        );

        self.after_change().await
    }

    pub async fn clear_upload(&self) -> Result<(), UploadSettingsError> {
        self.ensure_panel()?;
        self.options.delete_option(FAVICON_IMAGE_OPTION).await?;
        info!(target = SOURCE, op = "clear_upload", "Favicon upload removed");
        self.after_change().await
    }

    fn ensure_panel(&self) -> Result<(), UploadSettingsError> {
        if self.has_upload_panel {
            Ok(())
        } else {
            Err(UploadSettingsError::PanelDisabled)
        }
    }

    async fn after_change(&self) -> Result<(), UploadSettingsError> {
        if self.invalidate_on_change {
            self.cache.clear().await?;
        } else {
            info!(
                target = SOURCE,
                op = "after_change",
                key = self.cache.key(),
                "Keeping cached favicon path; clear it to pick up the new upload"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::FakeAttachments;
    use crate::cache::CacheConfig;
    use crate::infra::options::MemoryOptionStore;

    fn service(
        store: Arc<MemoryOptionStore>,
        attachments: Arc<FakeAttachments>,
        has_upload_panel: bool,
        invalidate_on_change: bool,
    ) -> FaviconUploadService {
        let cache = PathCache::new(store.clone(), &CacheConfig::default());
        FaviconUploadService::new(
            store,
            attachments,
            cache,
            has_upload_panel,
            invalidate_on_change,
        )
    }

    fn attachments() -> Arc<FakeAttachments> {
        Arc::new(FakeAttachments::default().with_image("A", "https://cdn/a-16x16.png"))
    }

    #[tokio::test]
    async fn set_upload_writes_option_and_derives_size() {
        let store = Arc::new(MemoryOptionStore::new());
        let attachments = attachments();
        let service = service(store.clone(), attachments.clone(), true, true);

        service.set_upload(" A ").await.expect("set upload");

        assert_eq!(service.current().await.unwrap().as_deref(), Some("A"));
        assert_eq!(attachments.generated(), vec![("A".to_string(), "favicon")]);
    }

    #[tokio::test]
    async fn change_clears_cache_when_invalidation_enabled() {
        let store = Arc::new(MemoryOptionStore::new());
        let service = service(store.clone(), attachments(), true, true);
        store
            .update_option("themeists_favicon_path", "/old.png")
            .await
            .unwrap();

        service.set_upload("A").await.expect("set upload");

        assert_eq!(store.get_option("themeists_favicon_path").await.unwrap(), None);
    }

    #[tokio::test]
    async fn change_keeps_stale_cache_when_invalidation_disabled() {
        let store = Arc::new(MemoryOptionStore::new());
        let service = service(store.clone(), attachments(), true, false);
        store
            .update_option("themeists_favicon_path", "/old.png")
            .await
            .unwrap();

        service.set_upload("A").await.expect("set upload");
        service.clear_upload().await.expect("clear upload");

        assert_eq!(
            store
                .get_option("themeists_favicon_path")
                .await
                .unwrap()
                .as_deref(),
            Some("/old.png")
        );
    }

    #[tokio::test]
    async fn rejects_blank_and_unknown_ids() {
        let store = Arc::new(MemoryOptionStore::new());
        let service = service(store, attachments(), true, true);

        assert!(matches!(
            service.set_upload("  ").await,
            Err(UploadSettingsError::ConstraintViolation(_))
        ));
        assert!(matches!(
            service.set_upload("nope").await,
            Err(UploadSettingsError::UnknownAttachment(id)) if id == "nope"
        ));
    }

    #[tokio::test]
    async fn disabled_panel_rejects_changes() {
        let store = Arc::new(MemoryOptionStore::new());
        let service = service(store, attachments(), false, true);

        assert!(matches!(
            service.set_upload("A").await,
            Err(UploadSettingsError::PanelDisabled)
        ));
        assert!(matches!(
            service.clear_upload().await,
            Err(UploadSettingsError::PanelDisabled)
        ));
    }

    #[tokio::test]
    async fn clear_upload_removes_option() {
        let store = Arc::new(MemoryOptionStore::new());
        let service = service(store, attachments(), true, true);
        service.set_upload("A").await.expect("set upload");

        service.clear_upload().await.expect("clear upload");
        assert_eq!(service.current().await.unwrap(), None);
    }
}
