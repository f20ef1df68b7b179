use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

use crate::domain::types::HeadSlot;

/// Command-line arguments for the icona binary.
#[derive(Debug, Parser)]
#[command(name = "icona", version, about = "Favicon resolution service")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "ICONA_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the public and admin HTTP listeners.
    Serve(Box<ServeArgs>),
    /// Print the current favicon path.
    Resolve(ResolveArgs),
    /// Print the head fragment for a slot.
    Render(RenderArgs),
    /// Clear the cached favicon path.
    #[command(name = "clear-cache")]
    ClearCache,
    /// Point the settings panel option at an uploaded attachment.
    #[command(name = "set-upload")]
    SetUpload(SetUploadArgs),
    /// Remove the settings panel option.
    #[command(name = "clear-upload")]
    ClearUpload,
    /// Verify that the image pipeline is available.
    Check,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the public listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the administrative listener host.
    #[arg(long = "server-admin-host", value_name = "HOST")]
    pub server_admin_host: Option<String>,

    /// Override the public listener port.
    #[arg(long = "server-public-port", value_name = "PORT")]
    pub public_port: Option<u16>,

    /// Override the administrative listener port.
    #[arg(long = "server-admin-port", value_name = "PORT")]
    pub admin_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the image CLI used for the activation check and derived sizes.
    #[arg(long = "images-cli-path", value_name = "PATH")]
    pub images_cli_path: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ResolveArgs {
    /// Ignore the cached path and resolve again.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub fresh: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RenderArgs {
    /// Which head to render for.
    #[arg(long, default_value = "public", value_parser = parse_slot)]
    pub slot: HeadSlot,
}

#[derive(Debug, Args, Clone)]
pub struct SetUploadArgs {
    /// Stored path of the uploaded attachment, relative to the uploads directory.
    #[arg(value_name = "ATTACHMENT_ID")]
    pub attachment_id: String,
}

fn parse_slot(value: &str) -> Result<HeadSlot, String> {
    value.parse().map_err(|err: crate::domain::error::DomainError| err.to_string())
}
