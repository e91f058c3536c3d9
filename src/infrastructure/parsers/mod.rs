//! Scan report parsers for the vulnerability schemas Harbor emits

pub mod harbor_adapter;
pub mod traits;
pub mod vulnerability_report;

pub use harbor_adapter::*;
pub use traits::*;
pub use vulnerability_report::*;
