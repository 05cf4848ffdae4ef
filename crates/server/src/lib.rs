//! Helper utilities to launch the Bundlescope API server.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use api::{self, ApiState};
use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::get,
};
use clickhouse_lib::ClickhouseReader;
use eyre::Result;
use runtime::{health, shutdown::ShutdownSignal};
mod rate_limit;
use rate_limit::RateLimitLayer;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};

/// Version prefix for all API routes.
pub const API_VERSION: &str = "v1";

/// Build the API router with CORS and tracing layers.
pub fn router(state: ApiState, allowed_origins: Vec<String>) -> Router {
    let allowed = Arc::new(allowed_origins);
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate({
            let allowed = Arc::clone(&allowed);
            move |origin: &HeaderValue, _| match origin.to_str() {
                Ok(origin) => {
                    allowed.iter().any(|o| o == origin)
                        || origin.starts_with("http://localhost:")
                        || origin.starts_with("http://127.0.0.1:")
                }
                Err(_) => false,
            }
        }))
        .allow_methods([Method::GET])
        .allow_headers(Any)
        .expose_headers(Any);
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let max_requests = state.max_requests();
    let rate_period = state.rate_period();
    let api_service = tower::ServiceBuilder::new()
        .layer(RateLimitLayer::new(max_requests, rate_period))
        .service(api::router(state));

    Router::new()
        .route("/health", get(health::handler))
        .nest_service(&format!("/{API_VERSION}"), api_service)
        .layer(cors)
        .layer(trace)
}

/// Run the API server on the given address until SIGINT or SIGTERM.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    addr: SocketAddr,
    client: ClickhouseReader,
    allowed_origins: Vec<String>,
    max_requests: u64,
    rate_period: Duration,
    cache_ttl: Duration,
    cache_max_entries: u64,
) -> Result<()> {
    let state =
        ApiState::with_cache(client, max_requests, rate_period, cache_ttl, cache_max_entries);
    let app = router(state, allowed_origins);

    info!("Starting API server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(ShutdownSignal::new())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::{DEFAULT_MAX_REQUESTS, DEFAULT_RATE_PERIOD};
    use axum::{
        body::{self, Body},
        http::{Request, StatusCode},
    };
    use clickhouse::test::Mock;
    use serde_json::{Value, json};
    use tower::util::ServiceExt;
    use url::Url;

    fn build_app(mock_url: &str, allowed: Vec<String>) -> Router {
        let url = Url::parse(mock_url).unwrap();
        let client =
            ClickhouseReader::new(url, "db".to_owned(), "user".into(), "pass".into()).unwrap();
        let state = ApiState::new(client, DEFAULT_MAX_REQUESTS, DEFAULT_RATE_PERIOD);
        router(state, allowed)
    }

    fn default_origins() -> Vec<String> {
        config::DEFAULT_ALLOWED_ORIGINS.split(',').map(|s| s.to_owned()).collect()
    }

    async fn send_request(app: Router, uri: &str, origin: &str) -> (StatusCode, Value, Option<String>) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header("Origin", origin)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let cors = response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        (status, body, cors)
    }

    #[tokio::test]
    async fn allows_default_origin() {
        let mock = Mock::new();
        let app = build_app(mock.url(), default_origins());
        let (status, body, cors) =
            send_request(app, "/health", "https://bundlescope.xyz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
        assert_eq!(cors.as_deref(), Some("https://bundlescope.xyz"));
    }

    #[tokio::test]
    async fn allows_extra_origin() {
        let mock = Mock::new();
        let mut origins = default_origins();
        origins.push("https://example.com".to_owned());
        let app = build_app(mock.url(), origins);
        let (status, _, cors) = send_request(app, "/health", "https://example.com").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cors.as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn allows_localhost_origin() {
        let mock = Mock::new();
        let app = build_app(mock.url(), default_origins());
        let (status, _, cors) = send_request(app, "/health", "http://localhost:5173").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cors.as_deref(), Some("http://localhost:5173"));
    }

    #[tokio::test]
    async fn denies_other_origin() {
        let mock = Mock::new();
        let app = build_app(mock.url(), default_origins());
        let (status, _, cors) = send_request(app, "/health", "https://notallowed.com").await;
        assert_eq!(status, StatusCode::OK);
        assert!(cors.is_none());
    }

    #[tokio::test]
    async fn api_routes_live_under_version_prefix() {
        let mock = Mock::new();
        let app = build_app(mock.url(), default_origins());
        // Bad params fail validation before any warehouse query runs, which
        // proves the nested service is reachable without mock handlers.
        let (status, body, _) = send_request(
            app,
            &format!("/{API_VERSION}/overview?chain=near"),
            "https://bundlescope.xyz",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["type"], "invalid-params");
    }

    #[tokio::test]
    async fn rate_limit_applies_to_api_routes_only() {
        let mock = Mock::new();
        let url = Url::parse(mock.url()).unwrap();
        let client =
            ClickhouseReader::new(url, "db".to_owned(), "user".into(), "pass".into()).unwrap();
        let state = ApiState::new(client, 1, Duration::from_secs(60));
        let app = router(state, default_origins());

        let uri = format!("/{API_VERSION}/overview?chain=near");
        let (first, _, _) =
            send_request(app.clone(), &uri, "https://bundlescope.xyz").await;
        assert_eq!(first, StatusCode::BAD_REQUEST);
        let (second, body, _) = send_request(app.clone(), &uri, "https://bundlescope.xyz").await;
        assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["type"], "rate-limit");

        // Health stays reachable once the API budget is spent.
        let (health, _, _) = send_request(app, "/health", "https://bundlescope.xyz").await;
        assert_eq!(health, StatusCode::OK);
    }
}
