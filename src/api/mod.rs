//! Network boundary to the HostPilot REST API

pub mod client;

pub use client::{fetch_fn, ApiClient, FetchError, Fetcher, FnFetcher, DEFAULT_BASE_URL};
