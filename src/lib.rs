//! HostPilot dashboard library
//!
//! Exposes the API client, the stale-while-revalidate cache, and CLI parsing
//! for use by the binary and in integration tests.

pub mod api;
pub mod cache;
pub mod cli;
pub mod logging;
pub mod models;
pub mod refresh;
