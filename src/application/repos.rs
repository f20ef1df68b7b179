//! Repository traits describing the host collaborators the core calls into.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::favicon::ImageSize;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("image pipeline error: {0}")]
    Pipeline(String),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Host-wide key-value settings, used both for configuration and as cache storage.
#[async_trait]
pub trait OptionStore: Send + Sync {
    async fn get_option(&self, key: &str) -> Result<Option<String>, RepoError>;
    async fn update_option(&self, key: &str, value: &str) -> Result<(), RepoError>;
    async fn delete_option(&self, key: &str) -> Result<(), RepoError>;
}

/// An attachment rendered at a named size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentImage {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Managed attachments uploaded through the settings panel.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Public url of the attachment at `size`, or `None` when the attachment is unknown.
    async fn image_src(
        &self,
        attachment_id: &str,
        size: ImageSize,
    ) -> Result<Option<AttachmentImage>, RepoError>;

    /// Ask the host image pipeline to produce the derived `size` variant.
    async fn generate_size(&self, attachment_id: &str, size: ImageSize) -> Result<(), RepoError>;
}

/// Existence checks against the site's public root directory.
#[async_trait]
pub trait SiteRoot: Send + Sync {
    async fn exists(&self, name: &str) -> Result<bool, RepoError>;
}

#[derive(Debug, Error)]
pub enum ImagePipelineError {
    #[error("image pipeline unavailable: {0}")]
    Unavailable(String),
    #[error("image pipeline invocation failed (exit {exit_code:?}): {stderr}")]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("image pipeline io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The host platform's image processing capability.
pub trait ImagePipeline: Send + Sync {
    fn probe(&self) -> Result<(), ImagePipelineError>;
    fn resize(
        &self,
        source: &Path,
        target: &Path,
        size: ImageSize,
    ) -> Result<(), ImagePipelineError>;
}
