//! Shared types for Ordo

pub mod error;

pub use error::{ApiError, Result};
