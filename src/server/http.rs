//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Routing is a plain
//! match over (method, path); the temporale handlers do the real work.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::routes;
use crate::store::{CalendarPaths, JsonStore};
use crate::temporale::names::{NameGenerator, TemplateNames};
use crate::types::ApiError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Cached JSON file store backing all calendar data
    pub store: JsonStore,
    /// Path layout of the calendar data directory
    pub paths: CalendarPaths,
    /// Display-name generator for synthesized ferial events
    pub names: Arc<dyn NameGenerator>,
    /// Bearer-token validator for write operations
    pub jwt: JwtValidator,
}

impl AppState {
    pub fn new(args: Args) -> Self {
        let paths = CalendarPaths::new(args.data_dir.clone());
        let jwt = JwtValidator::new(&args.jwt_secret(), args.jwt_audience.as_deref());
        Self {
            args,
            store: JsonStore::new(),
            paths,
            names: Arc::new(TemplateNames),
            jwt,
        }
    }
}

pub async fn run(state: Arc<AppState>) -> Result<(), ApiError> {
    let listener = TcpListener::bind(state.args.listen)
        .await
        .map_err(|e| ApiError::Config(format!("failed to bind {}: {}", state.args.listen, e)))?;

    info!(
        "Ordo listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - write authentication disabled");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(|q| q.to_string());

    info!("[{}] {} {}", addr, method, path);

    let accept_language = header_string(&req, "Accept-Language");
    let auth_header = header_string(&req, "Authorization");

    let response = match (method, path.as_str()) {
        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(Arc::clone(&state))
        }

        // Readiness probe
        (Method::GET, "/ready") | (Method::GET, "/readyz") => {
            routes::readiness_check(Arc::clone(&state))
        }

        // Build information
        (Method::GET, "/version") => routes::version_info(),

        // CORS preflight for the temporale surface
        (Method::OPTIONS, p) if p == "/temporale" || p.starts_with("/temporale/") => {
            preflight_response()
        }

        // Denormalized read (POST is an alias with identical semantics)
        (Method::GET, "/temporale") | (Method::POST, "/temporale") => {
            routes::handle_get_temporale(
                Arc::clone(&state),
                query.as_deref(),
                accept_language.as_deref(),
            )
            .await
        }

        // Create-only write
        (Method::PUT, "/temporale") => {
            match collect_body(req, state.args.max_body_bytes).await {
                Ok(body) => {
                    routes::handle_put_temporale(
                        Arc::clone(&state),
                        body,
                        accept_language.as_deref(),
                        auth_header.as_deref(),
                    )
                    .await
                }
                Err(response) => response,
            }
        }

        // Merge write
        (Method::PATCH, "/temporale") => {
            match collect_body(req, state.args.max_body_bytes).await {
                Ok(body) => {
                    routes::handle_patch_temporale(
                        Arc::clone(&state),
                        body,
                        accept_language.as_deref(),
                        auth_header.as_deref(),
                    )
                    .await
                }
                Err(response) => response,
            }
        }

        // Cross-store delete
        (Method::DELETE, p) if p.starts_with("/temporale/") => {
            let remainder = p.strip_prefix("/temporale/").unwrap_or("");
            routes::handle_delete_temporale(
                Arc::clone(&state),
                remainder,
                auth_header.as_deref(),
            )
            .await
        }

        _ => not_found_response(&path),
    };

    Ok(response)
}

fn header_string(req: &Request<Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Read the request body, enforcing the configured size limit
async fn collect_body(
    req: Request<Incoming>,
    max_bytes: usize,
) -> Result<Bytes, Response<Full<Bytes>>> {
    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("Failed to read request body: {}", e);
            return Err(ApiError::Validation("failed to read request body".to_string())
                .into_response());
        }
    };

    if body.len() > max_bytes {
        return Err(ApiError::Validation(format!(
            "request body exceeds {} bytes",
            max_bytes
        ))
        .into_response());
    }

    Ok(body)
}

fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, PATCH, DELETE, OPTIONS",
        )
        .header(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization, Accept-Language",
        )
        .body(Full::new(Bytes::new()))
        .unwrap()
}

fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    ApiError::NotFound(format!("no route for {}", path)).into_response()
}
