//! HTTP surfaces: the public site endpoints and the admin console endpoints.

mod admin;
mod middleware;
mod public;
mod state;

pub use admin::build_admin_router;
pub use public::build_router;
pub use state::{AdminState, HttpState};
