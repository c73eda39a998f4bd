pub mod build;
pub mod console;
pub mod lifecycle;
pub mod registry;
pub mod search;
