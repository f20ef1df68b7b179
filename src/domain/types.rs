//! Shared domain enumerations.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::error::DomainError;

/// Which priority level produced a resolved favicon path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    PanelUpload,
    RootFile,
    PluginDefault,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::PanelUpload => "panel_upload",
            SourceKind::RootFile => "root_file",
            SourceKind::PluginDefault => "plugin_default",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Injection point for the favicon link tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadSlot {
    #[default]
    Public,
    Admin,
}

impl HeadSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            HeadSlot::Public => "public",
            HeadSlot::Admin => "admin",
        }
    }
}

impl FromStr for HeadSlot {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(HeadSlot::Public),
            "admin" => Ok(HeadSlot::Admin),
            other => Err(DomainError::validation(format!(
                "unknown head slot `{other}` (expected `public` or `admin`)"
            ))),
        }
    }
}
