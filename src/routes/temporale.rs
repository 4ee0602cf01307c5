//! Temporale routes
//!
//! - `GET /temporale` (POST alias) - denormalized event list for a locale
//! - `PUT /temporale` - create the calendar (authenticated, create-only)
//! - `PATCH /temporale` - merge events into the calendar (authenticated)
//! - `DELETE /temporale/{event_key}` - remove an event everywhere (authenticated)
//!
//! Locale negotiation: an explicit `locale` query parameter resolves
//! strictly (a bad value is a 400); anything derived from the
//! Accept-Language header resolves leniently, falling back to Latin.
//! The resolved locale is echoed in the `X-Litcal-Temporale-Locale`
//! response header.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::auth;
use crate::server::AppState;
use crate::temporale::assemble::ReadAssembler;
use crate::temporale::delete::DeleteReconciler;
use crate::temporale::locale;
use crate::temporale::reconcile::WriteReconciler;
use crate::types::{ApiError, Result};

/// Response header carrying the resolved display locale
pub const LOCALE_HEADER: &str = "X-Litcal-Temporale-Locale";

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = match serde_json::to_vec(body) {
        Ok(json) => json,
        Err(e) => return ApiError::Internal(format!("failed to encode response: {}", e)).into_response(),
    };
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|_| ApiError::Internal("response build failed".to_string()).into_response())
}

/// Parse query string into key-value map
fn parse_query_params(query: &str) -> HashMap<String, String> {
    if query.is_empty() {
        return HashMap::new();
    }
    query
        .split('&')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let value = parts.next().unwrap_or("");
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Resolve the display locale for a read: explicit query parameter is
/// strict, Accept-Language is lenient, absence means the configured
/// default.
async fn resolve_display_locale(
    state: &AppState,
    query: Option<&str>,
    accept_language: Option<&str>,
) -> Result<String> {
    let available = state.paths.i18n_locales().await;

    if let Some(requested) = query.map(parse_query_params).and_then(|p| p.get("locale").cloned()) {
        return locale::select_locale(&requested, &available, true);
    }

    if let Some(tag) = accept_language.and_then(locale::from_accept_language) {
        return locale::select_locale(&tag, &available, false);
    }

    Ok(state.args.default_locale.clone())
}

/// The caller's base Accept-Language locale, used by the write
/// reconcilers to decide which translation every event must carry.
fn required_write_locale(state: &AppState, accept_language: Option<&str>) -> String {
    accept_language
        .and_then(locale::from_accept_language)
        .map(|tag| locale::base(&tag).to_string())
        .unwrap_or_else(|| state.args.default_locale.clone())
}

fn parse_body(body: &Bytes) -> Result<Value> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError::Validation(format!("request body is not valid JSON: {}", e)))
}

/// Handle GET /temporale (and its POST alias)
pub async fn handle_get_temporale(
    state: Arc<AppState>,
    query: Option<&str>,
    accept_language: Option<&str>,
) -> Response<Full<Bytes>> {
    let display_locale = match resolve_display_locale(&state, query, accept_language).await {
        Ok(l) => l,
        Err(e) => return e.into_response(),
    };

    let assembler = ReadAssembler::new(&state.store, &state.paths, state.names.as_ref());
    match assembler.assemble(&display_locale).await {
        Ok(calendar) => {
            debug!(
                locale = %calendar.locale,
                events = calendar.events.len(),
                "Assembled temporale response"
            );
            let mut response = json_response(StatusCode::OK, &calendar);
            if let Ok(header_value) = calendar.locale.parse() {
                response.headers_mut().insert(LOCALE_HEADER, header_value);
            }
            response
        }
        Err(e) => e.into_response(),
    }
}

/// Handle PUT /temporale
pub async fn handle_put_temporale(
    state: Arc<AppState>,
    body: Bytes,
    accept_language: Option<&str>,
    auth_header: Option<&str>,
) -> Response<Full<Bytes>> {
    if let Err(e) = auth::require_auth(&state, auth_header) {
        return e.into_response();
    }

    let payload = match parse_body(&body) {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };
    let required_locale = required_write_locale(&state, accept_language);

    let reconciler = WriteReconciler::new(&state.store, &state.paths);
    match reconciler.put(&payload, &required_locale).await {
        Ok(outcome) => {
            info!(
                stored = outcome.stored,
                ferial = outcome.ferial,
                "Temporale data created"
            );
            json_response(StatusCode::CREATED, &outcome)
        }
        Err(e) => e.into_response(),
    }
}

/// Handle PATCH /temporale
pub async fn handle_patch_temporale(
    state: Arc<AppState>,
    body: Bytes,
    accept_language: Option<&str>,
    auth_header: Option<&str>,
) -> Response<Full<Bytes>> {
    if let Err(e) = auth::require_auth(&state, auth_header) {
        return e.into_response();
    }

    let payload = match parse_body(&body) {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };
    let required_locale = required_write_locale(&state, accept_language);

    let reconciler = WriteReconciler::new(&state.store, &state.paths);
    match reconciler.patch(&payload, &required_locale).await {
        Ok(outcome) => {
            info!(
                updated = outcome.updated,
                added = outcome.added,
                ferial = outcome.ferial,
                "Temporale data patched"
            );
            json_response(StatusCode::OK, &outcome)
        }
        Err(e) => e.into_response(),
    }
}

/// Handle DELETE /temporale/{event_key}
///
/// The path remainder must be exactly one non-empty segment.
pub async fn handle_delete_temporale(
    state: Arc<AppState>,
    path_remainder: &str,
    auth_header: Option<&str>,
) -> Response<Full<Bytes>> {
    if let Err(e) = auth::require_auth(&state, auth_header) {
        return e.into_response();
    }

    if path_remainder.is_empty() || path_remainder.contains('/') {
        return ApiError::Validation(
            "expected exactly one event_key path parameter".to_string(),
        )
        .into_response();
    }

    let reconciler = DeleteReconciler::new(&state.store, &state.paths);
    match reconciler.delete(path_remainder).await {
        Ok(outcome) => {
            info!(
                event_key = %outcome.event_key,
                delete_type = outcome.delete_type,
                "Temporale event deleted"
            );
            json_response(StatusCode::OK, &outcome)
        }
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_params() {
        let params = parse_query_params("locale=en_US&year=2026");
        assert_eq!(params.get("locale").unwrap(), "en_US");
        assert_eq!(params.get("year").unwrap(), "2026");
        assert!(parse_query_params("").is_empty());
    }
}
