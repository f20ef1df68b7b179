use askama::{Error as AskamaError, Template};
use thiserror::Error;

use crate::domain::types::HeadSlot;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

#[derive(Template)]
#[template(
    source = r#"<link rel="Shortcut Icon" type="image/png" href="{{ href }}" />"#,
    ext = "html"
)]
struct FaviconLinkTemplate<'a> {
    href: &'a str,
}

/// Render the favicon link tag for `slot`. Both slots receive the same markup.
pub fn render_favicon_link(href: &str, slot: HeadSlot) -> Result<String, TemplateRenderError> {
    FaviconLinkTemplate { href }.render().map_err(|err| {
        TemplateRenderError::new(
            match slot {
                HeadSlot::Public => "presentation::views::render_favicon_link.public",
                HeadSlot::Admin => "presentation::views::render_favicon_link.admin",
            },
            "Favicon markup rendering failed",
            err,
        )
    })
}
