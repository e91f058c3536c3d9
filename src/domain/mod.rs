//! Domain Layer - Core business logic and entities
//!
//! Registry instances, artifacts and their normalized vulnerability data, and
//! the pure rules for resolving instances and selecting artifacts.

pub mod entities;
pub mod errors;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use services::*;
pub use value_objects::*;
