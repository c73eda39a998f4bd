pub mod host_cache;
pub mod ports;
pub mod services;
