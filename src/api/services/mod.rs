pub mod geoip;
pub mod health;

pub use geoip::{ClientIpHeaders, GeoIpService, geoip_routes};
pub use health::{AppStartTime, HealthService, health_routes};
