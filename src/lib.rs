//! geolookup - IP geolocation across rate-limited upstream providers
//!
//! This library resolves IP addresses through a pool of third-party GeoIP
//! APIs, spreading load between them and failing over when one is exhausted.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Command-line interface
//!
//! # Architecture
//! - `services::geoip`: provider registry, rate limiting, selection, caching and lookup
//! - `api`: HTTP routes
//! - `interfaces`: command-line interface
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging initialization

#[cfg(feature = "server")]
pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod system;
pub mod utils;
