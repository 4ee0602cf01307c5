//! JSON file store for calendar data
//!
//! All persisted calendar state lives in plain JSON files on disk. The
//! store provides cached reads, merge-writes and key removal over object
//! files, plus the path layout of the calendar data directory.

pub mod json;
pub mod paths;

pub use json::{JsonStore, StoreError};
pub use paths::CalendarPaths;
