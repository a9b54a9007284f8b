mod r#impl;
mod structs;
pub mod types;
pub mod validators;

pub use r#impl::{get_config, init_config, set_config};
pub use structs::*;
pub use types::{IpHeader, LoadBalanceStrategy};
