//! CLI command implementations.

pub mod banners;
pub mod reports;
