//! Markup emitted into host pages.

pub mod views;
