//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{
    CliArgs, Command, RenderArgs, ResolveArgs, ServeArgs, ServeOverrides, SetUploadArgs,
};

use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "icona";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_ADMIN_HOST: &str = "127.0.0.1";
const DEFAULT_PUBLIC_PORT: u16 = 3000;
const DEFAULT_ADMIN_PORT: u16 = 3001;
const DEFAULT_SITE_ROOT: &str = "public";
const DEFAULT_SITE_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_ASSET_PATH: &str = "static/icona/favicon.png";
const DEFAULT_UPLOAD_DIR: &str = "uploads";
const DEFAULT_OPTIONS_PATH: &str = "data/options.toml";
const DEFAULT_OPTIONS_NAMESPACE: &str = "themeists";
const DEFAULT_IMAGES_CLI_PATH: &str = "magick";

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub site: SiteSettings,
    pub uploads: UploadSettings,
    pub options: OptionsSettings,
    pub cache: CacheSettings,
    pub images: ImageSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_addr: SocketAddr,
    pub admin_addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Public web root probed for `favicon.png` / `favicon.ico`.
    pub root: PathBuf,
    /// Absolute site URL without a trailing slash.
    pub url: String,
    pub default_asset_url: String,
    pub has_upload_panel: bool,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub directory: PathBuf,
    pub public_url: String,
}

#[derive(Debug, Clone)]
pub struct OptionsSettings {
    pub path: PathBuf,
    pub namespace: String,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub invalidate_on_upload_change: bool,
}

#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub cli_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("ICONA").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    if let Some(Command::Serve(args)) = cli.command.as_ref() {
        raw.apply_serve_overrides(&args.overrides);
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    site: RawSiteSettings,
    uploads: RawUploadSettings,
    options: RawOptionsSettings,
    cache: RawCacheSettings,
    images: RawImageSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(host) = overrides.server_admin_host.as_ref() {
            self.server.admin_host = Some(host.clone());
        }
        if let Some(port) = overrides.public_port {
            self.server.public_port = Some(port);
        }
        if let Some(port) = overrides.admin_port {
            self.server.admin_port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(path) = overrides.images_cli_path.as_ref() {
            self.images.cli_path = Some(path.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            site,
            uploads,
            options,
            cache,
            images,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let site = build_site_settings(site)?;
        let uploads = build_upload_settings(uploads, &site)?;
        let options = build_options_settings(options)?;
        let cache = CacheSettings {
            invalidate_on_upload_change: cache.invalidate_on_upload_change.unwrap_or(true),
        };
        let images = build_image_settings(images)?;

        Ok(Self {
            server,
            logging,
            site,
            uploads,
            options,
            cache,
            images,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let admin_host = server
        .admin_host
        .unwrap_or_else(|| DEFAULT_ADMIN_HOST.to_string());

    let public_port = server.public_port.unwrap_or(DEFAULT_PUBLIC_PORT);
    if public_port == 0 {
        return Err(LoadError::invalid(
            "server.public_port",
            "port must be greater than zero",
        ));
    }

    let admin_port = server.admin_port.unwrap_or(DEFAULT_ADMIN_PORT);
    if admin_port == 0 {
        return Err(LoadError::invalid(
            "server.admin_port",
            "port must be greater than zero",
        ));
    }

    let public_addr = parse_socket_addr(&host, public_port)
        .map_err(|reason| LoadError::invalid("server.public_addr", reason))?;
    let admin_addr = parse_socket_addr(&admin_host, admin_port)
        .map_err(|reason| LoadError::invalid("server.admin_addr", reason))?;
    if public_addr == admin_addr {
        return Err(LoadError::invalid(
            "server.admin_port",
            "public and admin listeners must not share an address",
        ));
    }

    Ok(ServerSettings {
        public_addr,
        admin_addr,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let root = site
        .root
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SITE_ROOT));
    if root.as_os_str().is_empty() {
        return Err(LoadError::invalid("site.root", "path must not be empty"));
    }

    let url = absolute_url(
        "site.url",
        site.url.as_deref().unwrap_or(DEFAULT_SITE_URL),
    )?;
    let default_asset_url = match site.default_asset_url {
        Some(value) => absolute_url("site.default_asset_url", &value)?,
        None => format!("{url}/{DEFAULT_ASSET_PATH}"),
    };

    Ok(SiteSettings {
        root,
        url,
        default_asset_url,
        has_upload_panel: site.has_upload_panel.unwrap_or(true),
    })
}

fn build_upload_settings(
    uploads: RawUploadSettings,
    site: &SiteSettings,
) -> Result<UploadSettings, LoadError> {
    let directory = uploads
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "uploads.directory",
            "path must not be empty",
        ));
    }

    let public_url = match uploads.public_url {
        Some(value) => absolute_url("uploads.public_url", &value)?,
        None => format!("{}/{DEFAULT_UPLOAD_DIR}", site.url),
    };

    Ok(UploadSettings {
        directory,
        public_url,
    })
}

fn build_options_settings(options: RawOptionsSettings) -> Result<OptionsSettings, LoadError> {
    let path = options
        .path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OPTIONS_PATH));
    if path.as_os_str().is_empty() {
        return Err(LoadError::invalid("options.path", "path must not be empty"));
    }

    let namespace = options
        .namespace
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_OPTIONS_NAMESPACE.to_string());
    if namespace.contains(char::is_whitespace) {
        return Err(LoadError::invalid(
            "options.namespace",
            "namespace must not contain whitespace",
        ));
    }

    Ok(OptionsSettings { path, namespace })
}

fn build_image_settings(images: RawImageSettings) -> Result<ImageSettings, LoadError> {
    let cli_path = images
        .cli_path
        .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGES_CLI_PATH));
    if cli_path.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "images.cli_path",
            "path must not be empty",
        ));
    }

    Ok(ImageSettings { cli_path })
}

/// Validate an absolute http(s) URL and strip any trailing slash.
fn absolute_url(key: &'static str, value: &str) -> Result<String, LoadError> {
    let trimmed = value.trim();
    let parsed = Url::parse(trimmed)
        .map_err(|err| LoadError::invalid(key, format!("invalid url `{trimmed}`: {err}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            key,
            format!("unsupported scheme `{}`", parsed.scheme()),
        ));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    admin_host: Option<String>,
    public_port: Option<u16>,
    admin_port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    root: Option<PathBuf>,
    url: Option<String>,
    default_asset_url: Option<String>,
    has_upload_panel: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUploadSettings {
    directory: Option<PathBuf>,
    public_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawOptionsSettings {
    path: Option<PathBuf>,
    namespace: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    invalidate_on_upload_change: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawImageSettings {
    cli_path: Option<PathBuf>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}
