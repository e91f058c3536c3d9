//! HTTP controllers for handling requests

pub mod artifacts;
pub mod health;

pub use artifacts::*;
pub use health::*;
