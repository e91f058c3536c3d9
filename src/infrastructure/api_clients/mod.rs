//! API clients for Harbor registry instances

pub mod harbor;
pub mod traits;

pub use harbor::*;
pub use traits::*;
