//! Ordo - liturgical calendar REST API
//!
//! "Omnia autem honeste et secundum ordinem fiant" - 1 Corinthians 14:40
//!
//! Ordo serves the temporale cycle of the liturgical calendar over HTTP,
//! keeping four independently-evolving JSON stores consistent: the core
//! event list, per-locale name translations, per-locale lectionary
//! readings split across year cycles, and synthetically-derived ferial
//! events.
//!
//! ## Modules
//!
//! - **temporale**: the synchronization engine (classifier, readings
//!   shapes, locale resolution, read assembler, write/delete reconcilers)
//! - **store**: cached JSON file adapter and the data directory layout
//! - **server**: hyper HTTP server and routing
//! - **routes**: HTTP handlers
//! - **auth**: bearer-token validation for writes

pub mod auth;
pub mod config;
pub mod routes;
pub mod server;
pub mod store;
pub mod temporale;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{ApiError, Result};
