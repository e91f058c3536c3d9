//! Infrastructure Layer - External concerns and implementations
//!
//! This module handles external systems: Harbor's HTTP API, the cache backends
//! and the scan report formats.

pub mod api_clients;
pub mod cache;
pub mod parsers;

pub use api_clients::{HarborApiClient, HarborClient, UpstreamResponse};
pub use cache::*;
pub use parsers::ScanOverviewNormalizer;
