//! Favicon sources, resolved paths and the named favicon image size.

use std::path::Path;

use serde::Serialize;
use url::Url;

use super::types::SourceKind;

/// Option holding the attachment id uploaded through the settings panel.
pub const FAVICON_IMAGE_OPTION: &str = "favicon_image";

/// Site-root files probed in priority order. PNG wins when both exist.
pub const ROOT_CANDIDATES: [&str; 2] = ["favicon.png", "favicon.ico"];

/// A candidate favicon location, tagged with the priority level that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaviconSource {
    PanelUpload(String),
    RootFile(String),
    PluginDefault(String),
}

impl FaviconSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            FaviconSource::PanelUpload(_) => SourceKind::PanelUpload,
            FaviconSource::RootFile(_) => SourceKind::RootFile,
            FaviconSource::PluginDefault(_) => SourceKind::PluginDefault,
        }
    }

    pub fn into_path(self) -> String {
        match self {
            FaviconSource::PanelUpload(path)
            | FaviconSource::RootFile(path)
            | FaviconSource::PluginDefault(path) => path,
        }
    }
}

/// The favicon to serve now, plus the level it came from for diagnostics.
///
/// The url is never empty: construction goes through [`ResolvedPath::new`], which
/// callers only reach with a non-empty candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPath {
    url: String,
    source: SourceKind,
}

impl ResolvedPath {
    pub fn new(url: String, source: SourceKind) -> Option<Self> {
        (!url.trim().is_empty()).then_some(Self { url, source })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn into_url(self) -> String {
        self.url
    }
}

/// A named derived image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSize {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub crop: bool,
}

impl ImageSize {
    /// The 16x16 hard-cropped size served as the favicon.
    pub const FAVICON: ImageSize = ImageSize {
        name: "favicon",
        width: 16,
        height: 16,
        crop: true,
    };

    /// File name of the derived variant of `original`, e.g. `logo-16x16.png`.
    ///
    /// Returns `None` when `original` has no usable file name.
    pub fn variant_name(&self, original: &Path) -> Option<String> {
        let stem = original.file_stem()?.to_str()?;
        if stem.is_empty() {
            return None;
        }
        let suffix = format!("{stem}-{}x{}", self.width, self.height);
        match original.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if !ext.is_empty() => Some(format!("{suffix}.{ext}")),
            _ => Some(suffix),
        }
    }
}

/// An absolute, hierarchical url that relative paths can be appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(Url);

impl BaseUrl {
    /// Returns `None` unless `raw` is an absolute url with a path (not `mailto:` or `data:`).
    pub fn parse(raw: &str) -> Option<Self> {
        let url = Url::parse(raw.trim()).ok()?;
        (!url.cannot_be_a_base()).then_some(Self(url))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Append a `/`-separated relative path, percent-encoding every segment.
    ///
    /// Empty segments are dropped, so leading, trailing and doubled slashes
    /// on either side never produce `//`.
    pub fn join(&self, path: &str) -> String {
        let mut url = self.0.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(path.split('/').filter(|segment| !segment.is_empty()));
        }
        url.into()
    }
}
