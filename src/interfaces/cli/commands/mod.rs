//! CLI command implementations

mod config_gen;
mod lookup;
mod providers;

pub use config_gen::config_generate;
pub use lookup::lookup_ip;
pub use providers::list_providers;
