pub mod config;
pub mod container;
pub mod error;
pub mod fanout;
pub mod host;
pub mod session;
