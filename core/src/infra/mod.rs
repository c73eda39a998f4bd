pub mod config;
pub mod docker;
pub mod fetch;
pub mod metrics;
pub mod random;
pub mod registry;
