#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use icona::application::favicon::FaviconService;
use icona::application::repos::{
    AttachmentStore, ImagePipeline, ImagePipelineError, OptionStore, SiteRoot,
};
use icona::application::resolver::{FaviconResolver, ResolverConfig};
use icona::application::uploads::FaviconUploadService;
use icona::cache::{CacheConfig, PathCache};
use icona::domain::favicon::ImageSize;
use icona::infra::options::FileOptionStore;
use icona::infra::site_root::FsSiteRoot;
use icona::infra::uploads::UploadAttachments;
use tempfile::TempDir;

pub const SITE_URL: &str = "https://example.com";
pub const DEFAULT_ASSET: &str = "https://example.com/static/icona/favicon.png";
pub const UPLOADS_URL: &str = "https://example.com/uploads";

/// Pipeline that "resizes" by copying, so derived sizes exist without ImageMagick.
pub struct CopyPipeline;

impl ImagePipeline for CopyPipeline {
    fn probe(&self) -> Result<(), ImagePipelineError> {
        Ok(())
    }

    fn resize(
        &self,
        source: &Path,
        target: &Path,
        _size: ImageSize,
    ) -> Result<(), ImagePipelineError> {
        std::fs::copy(source, target)?;
        Ok(())
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub options: Arc<dyn OptionStore>,
    pub favicon: Arc<FaviconService>,
    pub uploads: Arc<FaviconUploadService>,
}

pub struct FixtureBuilder {
    has_upload_panel: bool,
    invalidate_on_upload_change: bool,
}

impl Default for FixtureBuilder {
    fn default() -> Self {
        Self {
            has_upload_panel: true,
            invalidate_on_upload_change: true,
        }
    }
}

impl FixtureBuilder {
    pub fn upload_panel(mut self, enabled: bool) -> Self {
        self.has_upload_panel = enabled;
        self
    }

    pub fn invalidate_on_upload_change(mut self, enabled: bool) -> Self {
        self.invalidate_on_upload_change = enabled;
        self
    }

    pub fn build(self) -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("public")).expect("site root");
        let (options, favicon, uploads) = self.wire(dir.path());
        Fixture {
            dir,
            options,
            favicon,
            uploads,
        }
    }

    /// Build services over an existing fixture directory, as a second process would.
    pub fn attach(self, fixture: &Fixture) -> (Arc<FaviconService>, Arc<FaviconUploadService>) {
        let (_, favicon, uploads) = self.wire(fixture.dir.path());
        (favicon, uploads)
    }

    fn wire(
        &self,
        root: &Path,
    ) -> (
        Arc<dyn OptionStore>,
        Arc<FaviconService>,
        Arc<FaviconUploadService>,
    ) {
        let options: Arc<dyn OptionStore> =
            Arc::new(FileOptionStore::new(root.join("options.toml")).expect("option store"));
        let attachments: Arc<dyn AttachmentStore> = Arc::new(
            UploadAttachments::new(root.join("uploads"), UPLOADS_URL, Arc::new(CopyPipeline))
                .expect("attachments"),
        );
        let site_root: Arc<dyn SiteRoot> = Arc::new(FsSiteRoot::new(root.join("public")));

        let cache_config = CacheConfig {
            invalidate_on_upload_change: self.invalidate_on_upload_change,
            ..Default::default()
        };
        let cache = PathCache::new(options.clone(), &cache_config);
        let config = ResolverConfig::new(self.has_upload_panel, SITE_URL, DEFAULT_ASSET)
            .expect("resolver config");
        let resolver =
            FaviconResolver::new(config, options.clone(), attachments.clone(), site_root);

        let favicon = Arc::new(FaviconService::new(resolver, cache.clone()));
        let uploads = Arc::new(FaviconUploadService::new(
            options.clone(),
            attachments,
            cache,
            self.has_upload_panel,
            self.invalidate_on_upload_change,
        ));
        (options, favicon, uploads)
    }
}

impl Fixture {
    pub fn builder() -> FixtureBuilder {
        FixtureBuilder::default()
    }

    pub fn site_root(&self) -> PathBuf {
        self.dir.path().join("public")
    }

    pub fn write_root_file(&self, name: &str) {
        std::fs::write(self.site_root().join(name), b"icon").expect("write root file");
    }

    /// Store an uploaded PNG under the uploads directory.
    pub fn write_upload(&self, stored_path: &str, width: u32, height: u32) {
        let path = self.dir.path().join("uploads").join(stored_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("upload dir");
        }
        std::fs::write(path, png_header(width, height)).expect("write upload");
    }
}

/// Smallest PNG prefix that carries dimensions.
pub fn png_header(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes
}
