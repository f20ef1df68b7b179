//! Filesystem probe for favicon files placed in the site's public root.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::application::repos::{RepoError, SiteRoot};

#[derive(Debug, Clone)]
pub struct FsSiteRoot {
    root: PathBuf,
}

impl FsSiteRoot {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl SiteRoot for FsSiteRoot {
    async fn exists(&self, name: &str) -> Result<bool, RepoError> {
        let relative = Path::new(name);
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            return Err(RepoError::invalid_input(format!(
                "`{name}` is not a plain site-root file name"
            )));
        }

        match fs::metadata(self.root.join(relative)).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(RepoError::from_persistence(err)),
        }
    }
}
