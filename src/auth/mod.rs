//! Authentication for write operations
//!
//! PUT, PATCH and DELETE require a bearer token issued by the external
//! identity provider and signed with the shared secret. Token issuance,
//! OIDC flows and role management live outside this service; only
//! validation happens here. Dev mode disables the check.

pub mod jwt;

pub use jwt::{extract_token_from_header, Claims, JwtValidator};

use crate::server::AppState;
use crate::types::{ApiError, Result};

/// Enforce bearer-token authentication for a write request.
///
/// Returns the validated claims, or Unauthorized. In dev mode the check
/// is skipped and an anonymous subject is returned.
pub fn require_auth(state: &AppState, auth_header: Option<&str>) -> Result<Claims> {
    if state.args.dev_mode {
        return Ok(Claims::anonymous());
    }

    let token = extract_token_from_header(auth_header).ok_or_else(|| {
        ApiError::Unauthorized("missing bearer token".to_string())
    })?;

    state.jwt.validate(token)
}
