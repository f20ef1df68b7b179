//! Infrastructure adapters and runtime bootstrap.

pub mod error;
pub mod http;
pub mod images;
pub mod options;
pub mod site_root;
pub mod telemetry;
pub mod uploads;
