//! HTTP server exposing the token swap endpoints.
//!
//! Parameters are read from the query string and the request body (form
//! encoded, or JSON when the content type says so); body values win.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{RawQuery, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowMethods, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::error::{Result, SwapError};
use crate::handler::TokenSwap;
use crate::middleware::REFRESH_TOKEN_PARAM;
use crate::types::{Params, SwapResponse};

/// Default port the server listens on.
pub const DEFAULT_PORT: u16 = 4343;

/// Value of `Access-Control-Allow-Methods` on every response.
const ALLOWED_METHODS: &str = "OPTIONS, GET, POST";

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        }
    }
}

impl ServerConfig {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self { bind_addr }
    }
}

struct AppState {
    swap: TokenSwap,
}

/// The token swap HTTP server.
pub struct SwapServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl SwapServer {
    pub fn new(swap: TokenSwap, config: ServerConfig) -> Self {
        Self {
            state: Arc::new(AppState { swap }),
            config,
        }
    }

    /// Build the axum router.
    ///
    /// Every response, preflights included, carries
    /// `Access-Control-Allow-Origin: *` and the same
    /// `Access-Control-Allow-Methods` value.
    pub fn router(&self) -> Router {
        let allowed_methods = HeaderValue::from_static(ALLOWED_METHODS);

        Router::new()
            .route("/api/token", post(handle_token))
            .route("/api/refresh_token", post(handle_refresh_token))
            .route("/health", get(handle_health))
            .with_state(self.state.clone())
            .layer(SetResponseHeaderLayer::if_not_present(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                allowed_methods.clone(),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(AllowMethods::list([Method::OPTIONS, Method::GET, Method::POST]))
                    .allow_headers(Any),
            )
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` resolves, then drain in-flight
    /// requests.
    pub async fn run_until(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            encryption = self.state.swap.encrypts_refresh_tokens(),
            "Starting token swap server"
        );
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}

/// Handle POST /api/token
async fn handle_token(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> SwapResponse {
    let code = collect_params(query.as_deref(), &headers, &body).and_then(|mut params| {
        params
            .remove("code")
            .ok_or_else(|| SwapError::missing_param("code"))
    });

    match code {
        Ok(code) => state.swap.handle_token_exchange(&code).await,
        Err(e) => reject(e),
    }
}

/// Handle POST /api/refresh_token
async fn handle_refresh_token(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> SwapResponse {
    let params = collect_params(query.as_deref(), &headers, &body).and_then(|params| {
        if params.contains_key(REFRESH_TOKEN_PARAM) {
            Ok(params)
        } else {
            Err(SwapError::missing_param(REFRESH_TOKEN_PARAM))
        }
    });

    match params {
        Ok(params) => state.swap.handle_refresh(&params).await,
        Err(e) => reject(e),
    }
}

/// Handle GET /health
async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "tokenswap",
        "encryption": state.swap.encrypts_refresh_tokens(),
    }))
}

fn reject(err: SwapError) -> SwapResponse {
    tracing::warn!(error = %err, "Rejected request");
    SwapResponse::error(err.to_string())
}

/// Merge query string and body parameters.
fn collect_params(query: Option<&str>, headers: &HeaderMap, body: &[u8]) -> Result<Params> {
    let mut params: Params = query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    if body.is_empty() {
        return Ok(params);
    }

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if is_json {
        let fields: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(body)
            .map_err(|e| SwapError::InvalidRequest(format!("Invalid JSON: {}", e)))?;
        for (key, value) in fields {
            if let serde_json::Value::String(value) = value {
                params.insert(key, value);
            }
        }
    } else {
        params.extend(url::form_urlencoded::parse(body).into_owned());
    }

    Ok(params)
}

impl IntoResponse for SwapResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_REQUEST);
        (status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers
    }

    #[test]
    fn test_collect_params_query_only() {
        let params = collect_params(Some("code=abc&state=x%20y"), &HeaderMap::new(), b"").unwrap();
        assert_eq!(params["code"], "abc");
        assert_eq!(params["state"], "x y");
    }

    #[test]
    fn test_collect_params_form_body_wins() {
        let params =
            collect_params(Some("code=from-query"), &HeaderMap::new(), b"code=from-body").unwrap();
        assert_eq!(params["code"], "from-body");
    }

    #[test]
    fn test_collect_params_json_body() {
        let params = collect_params(
            None,
            &json_headers(),
            br#"{"refresh_token": "v1:abc", "ignored": 3}"#,
        )
        .unwrap();
        assert_eq!(params["refresh_token"], "v1:abc");
        assert!(!params.contains_key("ignored"));
    }

    #[test]
    fn test_collect_params_invalid_json() {
        let err = collect_params(None, &json_headers(), b"{not json").unwrap_err();
        assert!(matches!(err, SwapError::InvalidRequest(_)));
    }

    #[test]
    fn test_collect_params_keeps_literal_escaped_newline() {
        let params =
            collect_params(None, &HeaderMap::new(), b"refresh_token=abc%5Cndef").unwrap();
        assert_eq!(params["refresh_token"], "abc\\ndef");
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
        assert!(config.bind_addr.ip().is_unspecified());
    }
}
