//! In-memory collaborators for application tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::application::repos::{
    AttachmentImage, AttachmentStore, OptionStore, RepoError, SiteRoot,
};
use crate::domain::favicon::ImageSize;

#[derive(Default)]
pub(crate) struct FakeAttachments {
    images: HashMap<String, AttachmentImage>,
    failing: bool,
    generated: Mutex<Vec<(String, &'static str)>>,
}

impl FakeAttachments {
    pub(crate) fn with_image(mut self, id: &str, url: &str) -> Self {
        self.images.insert(
            id.to_string(),
            AttachmentImage {
                url: url.to_string(),
                width: Some(16),
                height: Some(16),
            },
        );
        self
    }

    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub(crate) fn generated(&self) -> Vec<(String, &'static str)> {
        self.generated
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AttachmentStore for FakeAttachments {
    async fn image_src(
        &self,
        attachment_id: &str,
        _size: ImageSize,
    ) -> Result<Option<AttachmentImage>, RepoError> {
        if self.failing {
            return Err(RepoError::from_persistence("attachment storage unavailable"));
        }
        Ok(self.images.get(attachment_id).cloned())
    }

    async fn generate_size(&self, attachment_id: &str, size: ImageSize) -> Result<(), RepoError> {
        if self.failing {
            return Err(RepoError::Pipeline("resize failed".to_string()));
        }
        if let Ok(mut guard) = self.generated.lock() {
            guard.push((attachment_id.to_string(), size.name));
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeSiteRoot {
    files: HashSet<String>,
    failing: HashSet<String>,
}

impl FakeSiteRoot {
    pub(crate) fn with_file(mut self, name: &str) -> Self {
        self.files.insert(name.to_string());
        self
    }

    pub(crate) fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }
}

#[async_trait]
impl SiteRoot for FakeSiteRoot {
    async fn exists(&self, name: &str) -> Result<bool, RepoError> {
        if self.failing.contains(name) {
            return Err(RepoError::from_persistence("permission denied"));
        }
        Ok(self.files.contains(name))
    }
}

pub(crate) struct BrokenOptionStore;

#[async_trait]
impl OptionStore for BrokenOptionStore {
    async fn get_option(&self, _key: &str) -> Result<Option<String>, RepoError> {
        Err(RepoError::from_persistence("option store offline"))
    }

    async fn update_option(&self, _key: &str, _value: &str) -> Result<(), RepoError> {
        Err(RepoError::from_persistence("option store offline"))
    }

    async fn delete_option(&self, _key: &str) -> Result<(), RepoError> {
        Err(RepoError::from_persistence("option store offline"))
    }
}
