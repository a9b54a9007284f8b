//! Service layer for business logic
//!
//! Shared by the HTTP API and the CLI.

pub mod geoip;

pub use geoip::GeoResolver;
