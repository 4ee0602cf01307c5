//! HTTP routes for Ordo

pub mod health;
pub mod temporale;

pub use health::{health_check, readiness_check, version_info};
pub use temporale::{
    handle_delete_temporale, handle_get_temporale, handle_patch_temporale, handle_put_temporale,
};
