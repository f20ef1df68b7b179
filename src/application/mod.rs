//! Application services: resolution, caching and upload settings.

pub mod activation;
pub mod error;
pub mod favicon;
pub mod repos;
pub mod resolver;
pub mod uploads;

#[cfg(test)]
pub(crate) mod testing;
