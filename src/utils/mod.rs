pub mod ip;

pub use ip::extract_client_ip;
#[cfg(feature = "server")]
pub use ip::client_ip_from_request;
