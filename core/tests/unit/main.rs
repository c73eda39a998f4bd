//! Unit tests for flotilla-core application services.
//!
//! These tests wire the services to mocked ports and run fast without
//! any engine or filesystem I/O.

#![allow(clippy::expect_used)]

mod build_service;
mod mocks;
mod search_console;
