use std::sync::Arc;

use crate::application::{favicon::FaviconService, uploads::FaviconUploadService};

#[derive(Clone)]
pub struct HttpState {
    pub favicon: Arc<FaviconService>,
}

#[derive(Clone)]
pub struct AdminState {
    pub favicon: Arc<FaviconService>,
    pub uploads: Arc<FaviconUploadService>,
}
