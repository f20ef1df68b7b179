//! Option store adapters: a TOML file shared between processes, and an in-memory map.

use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use tempfile::NamedTempFile;
use tokio::{fs, sync::Mutex};
use tracing::debug;

use crate::application::repos::{OptionStore, RepoError};

use super::error::InfraError;

const SOURCE: &str = "infra::options";

/// Process-local option store.
#[derive(Debug, Default)]
pub struct MemoryOptionStore {
    entries: DashMap<String, String>,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OptionStore for MemoryOptionStore {
    async fn get_option(&self, key: &str) -> Result<Option<String>, RepoError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn update_option(&self, key: &str, value: &str) -> Result<(), RepoError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete_option(&self, key: &str) -> Result<(), RepoError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Options persisted as a flat TOML table.
///
/// Every read goes to disk so that separate processes sharing the file observe
/// each other's writes. Writes replace the file atomically; writers within one
/// process are serialized, across processes the last writer wins.
#[derive(Debug)]
pub struct FileOptionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileOptionStore {
    /// Open the store at `path`, creating its parent directory if necessary.
    pub fn new(path: PathBuf) -> Result<Self, InfraError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                InfraError::storage(format!(
                    "failed to create option directory `{}`: {err}",
                    parent.display()
                ))
            })?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, RepoError> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => toml::from_str(&text).map_err(|err| {
                RepoError::from_persistence(format!(
                    "failed to parse option file `{}`: {err}",
                    self.path.display()
                ))
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(RepoError::from_persistence(format!(
                "failed to read option file `{}`: {err}",
                self.path.display()
            ))),
        }
    }

    async fn persist(&self, options: &BTreeMap<String, String>) -> Result<(), RepoError> {
        let contents = toml::to_string(options).map_err(RepoError::from_persistence)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, contents.as_bytes()))
            .await
            .map_err(RepoError::from_persistence)?
            .map_err(|err| {
                RepoError::from_persistence(format!(
                    "failed to write option file `{}`: {err}",
                    self.path.display()
                ))
            })
    }

    async fn modify<F>(&self, op: &'static str, key: &str, apply: F) -> Result<(), RepoError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self.write_lock.lock().await;
        let mut options = self.load().await?;
        if apply(&mut options) {
            self.persist(&options).await?;
        }
        debug!(
            target = SOURCE,
            op,
            key,
            path = %self.path.display(),
            "Option store updated"
        );
        Ok(())
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[async_trait]
impl OptionStore for FileOptionStore {
    async fn get_option(&self, key: &str) -> Result<Option<String>, RepoError> {
        let mut options = self.load().await?;
        Ok(options.remove(key))
    }

    async fn update_option(&self, key: &str, value: &str) -> Result<(), RepoError> {
        self.modify("update_option", key, |options| {
            options.insert(key.to_string(), value.to_string());
            true
        })
        .await
    }

    async fn delete_option(&self, key: &str) -> Result<(), RepoError> {
        self.modify("delete_option", key, |options| options.remove(key).is_some())
            .await
    }
}
