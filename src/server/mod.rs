//! HTTP server for Ordo

pub mod http;

pub use http::{run, AppState};
