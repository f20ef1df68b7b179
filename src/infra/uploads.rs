//! Filesystem-backed attachments for the favicon upload panel.
//!
//! An attachment is a file below the uploads directory, identified by its
//! relative stored path (e.g. `2025/10/logo.png`). Derived sizes live next to
//! the original as `{stem}-{W}x{H}.{ext}`.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use crate::application::repos::{AttachmentImage, AttachmentStore, ImagePipeline, RepoError};
use crate::domain::favicon::{BaseUrl, ImageSize};

const SOURCE: &str = "infra::uploads";

#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error("uploads public url `{0}` is not an absolute url")]
    InvalidPublicUrl(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<UploadStorageError> for RepoError {
    fn from(err: UploadStorageError) -> Self {
        match err {
            UploadStorageError::InvalidPath => RepoError::invalid_input("invalid attachment id"),
            UploadStorageError::InvalidPublicUrl(url) => {
                RepoError::invalid_input(format!("invalid uploads public url `{url}`"))
            }
            UploadStorageError::Io(err) => RepoError::from_persistence(err),
        }
    }
}

pub struct UploadAttachments {
    root: PathBuf,
    public_url: BaseUrl,
    pipeline: Arc<dyn ImagePipeline>,
}

impl std::fmt::Debug for UploadAttachments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadAttachments")
            .field("root", &self.root)
            .field("public_url", &self.public_url.as_str())
            .finish_non_exhaustive()
    }
}

impl UploadAttachments {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    ///
    /// `public_url` is the absolute url the uploads directory is served under.
    pub fn new(
        root: PathBuf,
        public_url: &str,
        pipeline: Arc<dyn ImagePipeline>,
    ) -> Result<Self, UploadStorageError> {
        let public_url = BaseUrl::parse(public_url)
            .ok_or_else(|| UploadStorageError::InvalidPublicUrl(public_url.to_string()))?;
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            public_url,
            pipeline,
        })
    }

    /// Resolve the absolute filesystem path for a stored upload.
    fn resolve(&self, stored_path: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(stored_path);
        if stored_path.is_empty()
            || relative.is_absolute()
            || relative.components().any(|component| {
                matches!(
                    component,
                    Component::ParentDir | Component::Prefix(_) | Component::RootDir
                )
            })
        {
            return Err(UploadStorageError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }

    /// Stored path of the derived `size` variant of `stored_path`.
    fn variant_path(stored_path: &str, size: ImageSize) -> Result<String, UploadStorageError> {
        let original = Path::new(stored_path);
        let name = size
            .variant_name(original)
            .ok_or(UploadStorageError::InvalidPath)?;
        let variant = match original.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
            _ => PathBuf::from(name),
        };
        Ok(variant.to_string_lossy().replace('\\', "/"))
    }

    fn public_url_for(&self, stored_path: &str) -> String {
        self.public_url.join(stored_path)
    }
}

async fn is_file(path: &Path) -> Result<bool, UploadStorageError> {
    match fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.is_file()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(UploadStorageError::Io(err)),
    }
}

async fn read_dimensions(path: PathBuf) -> (Option<u32>, Option<u32>) {
    let probed = tokio::task::spawn_blocking(move || imagesize::size(&path)).await;
    match probed {
        Ok(Ok(size)) => (
            u32::try_from(size.width).ok(),
            u32::try_from(size.height).ok(),
        ),
        Ok(Err(err)) => {
            debug!(
                target = SOURCE,
                op = "read_dimensions",
                error = %err,
                "Could not read image dimensions"
            );
            (None, None)
        }
        Err(err) => {
            warn!(
                target = SOURCE,
                op = "read_dimensions",
                error = %err,
                "Dimension probe task failed"
            );
            (None, None)
        }
    }
}

#[async_trait]
impl AttachmentStore for UploadAttachments {
    async fn image_src(
        &self,
        attachment_id: &str,
        size: ImageSize,
    ) -> Result<Option<AttachmentImage>, RepoError> {
        let original = self.resolve(attachment_id)?;
        if !is_file(&original).await? {
            return Ok(None);
        }

        let variant = Self::variant_path(attachment_id, size)?;
        let variant_absolute = self.resolve(&variant)?;
        if is_file(&variant_absolute).await? {
            return Ok(Some(AttachmentImage {
                url: self.public_url_for(&variant),
                width: Some(size.width),
                height: Some(size.height),
            }));
        }

        let (width, height) = read_dimensions(original).await;
        Ok(Some(AttachmentImage {
            url: self.public_url_for(attachment_id),
            width,
            height,
        }))
    }

    async fn generate_size(&self, attachment_id: &str, size: ImageSize) -> Result<(), RepoError> {
        let source = self.resolve(attachment_id)?;
        if !is_file(&source).await? {
            return Err(RepoError::NotFound);
        }
        let target = self.resolve(&Self::variant_path(attachment_id, size)?)?;

        let pipeline = self.pipeline.clone();
        tokio::task::spawn_blocking(move || pipeline.resize(&source, &target, size))
            .await
            .map_err(|err| RepoError::Pipeline(err.to_string()))?
            .map_err(|err| RepoError::Pipeline(err.to_string()))
    }
}
