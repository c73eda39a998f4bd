//! flotilla — multi-host container lifecycle control plane.
//!
//! Tracks a fleet of remote container-engine hosts, keeps a TTL-cached
//! view of each host's containers, and executes lifecycle operations
//! (create, stop, restart, destroy, clone, build-image) with per-host
//! error isolation. Presentation, authentication, and transport live
//! in external callers; they reach the core through [`ControlPlane`]
//! or directly through the application services.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod app;
pub mod application;
pub mod domain;
pub mod infra;

pub use app::ControlPlane;
