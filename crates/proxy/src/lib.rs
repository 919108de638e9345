#![deny(unsafe_code)]
//! `GET /api/proxy`: forwards to the project cards API.
//!
//! Only GET is served; HEAD and every other method get a 405. The upstream
//! exchange (headers and body) must finish within the configured timeout.
//! Successful JSON responses are passed through byte for byte with their
//! status; every other outcome is a [`ProxyError`]. All responses, errors
//! included, carry permissive CORS headers and the CDN cache policy.

pub mod config;
pub mod error;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE,
};
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::middleware::{from_fn, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::de::IgnoredAny;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use config::ProxyConfig;
pub use error::{ConfigError, ProxyError};

pub const PROXY_PATH: &str = "/api/proxy";

/// Cache policy for shared caches in front of the proxy.
pub const CACHE_POLICY: &str = "s-maxage=300, stale-while-revalidate=600";

#[derive(Clone)]
pub struct AppState {
    config: Arc<ProxyConfig>,
    client: reqwest::Client,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(PROXY_PATH, get(proxy).fallback(method_not_allowed))
        .layer(from_fn(contract_headers_middleware))
        .with_state(state)
}

async fn contract_headers_middleware(req: Request<Body>, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_POLICY));
    resp
}

async fn method_not_allowed(req: Request<Body>) -> Response {
    reject_method(req.method())
}

fn reject_method(method: &Method) -> Response {
    let err = ProxyError::MethodNotAllowed;
    warn!(method = %method, status = err.status().as_u16(), "proxy request rejected");
    err.into_response()
}

async fn proxy(method: Method, State(state): State<AppState>) -> Response {
    // axum routes HEAD to GET handlers.
    if method != Method::GET {
        return reject_method(&method);
    }
    let started = Instant::now();
    let result = fetch_upstream(&state).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok((status, body)) => {
            info!(status = status.as_u16(), elapsed_ms, "proxy request served");
            (status, [(CONTENT_TYPE, "application/json")], body).into_response()
        }
        Err(err) => {
            warn!(
                status = err.status().as_u16(),
                elapsed_ms,
                error = %err,
                "proxy request failed"
            );
            err.into_response()
        }
    }
}

/// One upstream exchange under the configured timeout. On success returns
/// the upstream status and its body, checked to be JSON but left untouched.
pub async fn fetch_upstream(state: &AppState) -> Result<(StatusCode, Bytes), ProxyError> {
    let limit = state.config.timeout;
    let exchange = async {
        let resp = state
            .client
            .get(&state.config.upstream)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| network_error(e, limit))?;
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await.map_err(|e| network_error(e, limit))?;
        Ok::<_, ProxyError>((status, bytes))
    };
    let (status, bytes) = tokio::time::timeout(limit, exchange)
        .await
        .map_err(|_| ProxyError::Timeout(limit))??;

    if !(200..300).contains(&status) {
        return Err(ProxyError::Upstream {
            status,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }
    serde_json::from_slice::<IgnoredAny>(&bytes).map_err(|e| ProxyError::Decode(e.to_string()))?;
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);
    Ok((status, bytes))
}

fn network_error(e: reqwest::Error, limit: std::time::Duration) -> ProxyError {
    if e.is_timeout() {
        ProxyError::Timeout(limit)
    } else {
        ProxyError::Network(e.to_string())
    }
}

/// Installs the global subscriber: `RUST_LOG` filter (default `info`),
/// JSON lines when `json` is set.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
