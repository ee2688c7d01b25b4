//! Domain layer - error taxonomy and the contracts of host collaborators
//!
//! The engine depends only on these traits; concrete adapters live in
//! [`crate::infrastructure`].

pub mod errors;
pub mod repositories;
pub mod services;

pub use errors::*;
pub use repositories::*;
pub use services::*;
