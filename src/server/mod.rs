//! HTTP API.
//!
//! Routes:
//! - `GET /ping` liveness check, no auth
//! - `POST /ping` latency measurement, bearer auth
//! - `GET /metrics` Prometheus exposition, no auth
//!
//! Unknown routes get a JSON 404 and panics inside handlers are turned
//! into the standard 500 envelope.

pub mod auth;
pub mod handlers;
pub mod response;

use crate::config::{SecretKey, Settings};
use crate::metrics::{Metrics, MetricsPusher};
use crate::prober::LatencyProber;
use crate::token::TokenVerifier;
use anyhow::Context;
use axum::extract::{MatchedPath, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use response::{ApiError, SERVER_FUNCTION};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub prober: Arc<LatencyProber>,
    pub verifier: Arc<TokenVerifier>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(prober: LatencyProber, secret: &SecretKey, metrics: Metrics) -> Self {
        Self {
            prober: Arc::new(prober),
            verifier: Arc::new(TokenVerifier::new(secret)),
            metrics,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/ping", get(handlers::pong).post(handlers::measure))
        .route("/metrics", get(handlers::metrics));

    with_layers(routes, state)
}

fn with_layers(routes: Router<AppState>, state: AppState) -> Router {
    routes
        .fallback(handlers::not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

/// Count and time every request by its route template.
async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let method = req.method().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    state
        .metrics
        .observe_request(&method, &route, response.status().as_u16(), start.elapsed());
    response
}

fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "request handler panicked");
    ApiError::internal("Internal server error", SERVER_FUNCTION).into_response()
}

/// Run the server until SIGINT or SIGTERM, then flush metrics once more.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let metrics = Metrics::new().context("failed to create metrics registry")?;
    let prober =
        LatencyProber::tcp(settings.probe.clone()).context("invalid probe configuration")?;
    let state = AppState::new(prober, &settings.secret, metrics.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, env = %settings.env, "server listening");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pusher = match settings.push.clone() {
        Some(push) => Some(tokio::spawn(MetricsPusher::new(push, metrics).run(shutdown_rx))),
        None => {
            warn!(
                "metrics push disabled: set GRAFANA_CLOUD_URL (or PROMETHEUS_PUSH_URL), \
                 GRAFANA_CLOUD_USERNAME and GRAFANA_CLOUD_API_KEY to enable it"
            );
            None
        }
    };

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("HTTP server closed");

    let _ = shutdown_tx.send(true);
    if let Some(handle) = pusher {
        if let Err(e) = handle.await {
            warn!(error = %e, "metrics push task ended abnormally");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prober::testing::{ScriptedConnector, Step};
    use crate::prober::ProbeConfig;
    use crate::token::{Claims, TokenIssuer};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request as HttpRequest, StatusCode};
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn secret() -> SecretKey {
        SecretKey::new("test-secret")
    }

    fn state(connector: Arc<ScriptedConnector>) -> AppState {
        let prober = LatencyProber::new(connector, ProbeConfig::default()).unwrap();
        AppState::new(prober, &secret(), Metrics::new().unwrap())
    }

    fn token() -> String {
        TokenIssuer::new(&secret()).short_lived(None, 1).unwrap()
    }

    fn ping_request(auth: Option<&str>, body: &str) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder()
            .method(Method::POST)
            .uri("/ping")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn send(app: Router, req: HttpRequest<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_liveness() {
        let app = router(state(ScriptedConnector::new([])));
        let resp = app
            .oneshot(HttpRequest::get("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"pong");
    }

    #[tokio::test]
    async fn test_ping_success() {
        let connector =
            ScriptedConnector::new([Step::Connect(10), Step::Connect(20), Step::Connect(31)]);
        let app = router(state(connector.clone()));
        let auth = format!("Bearer {}", token());

        let (status, body) = send(app, ping_request(Some(&auth), r#"{"ip_address":"8.8.8.8"}"#)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "success": true,
                "ip": "8.8.8.8",
                "average_ping_ms": 20,
                "individual_times_ms": [10, 20, 31],
                "port_used": 443
            })
        );
        assert_eq!(connector.ports_called(), vec![443, 443, 443]);
    }

    #[tokio::test]
    async fn test_invalid_ip_never_probes() {
        let connector = ScriptedConnector::always(5, 3);
        let app = router(state(connector.clone()));
        let auth = format!("Bearer {}", token());

        let (status, body) =
            send(app, ping_request(Some(&auth), r#"{"ip_address":"999.1.1.1"}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid IP address format" }));
        assert!(connector.ports_called().is_empty());
    }

    #[tokio::test]
    async fn test_missing_ip() {
        let auth = format!("Bearer {}", token());
        for payload in ["{}", "", "not json", r#"{"ip_address":""}"#] {
            let app = router(state(ScriptedConnector::new([])));
            let (status, body) = send(app, ping_request(Some(&auth), payload)).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload:?}");
            assert_eq!(body, json!({ "error": "Missing IP address in request body" }));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_target() {
        let connector = ScriptedConnector::new([]);
        let app = router(state(connector.clone()));
        let auth = format!("Bearer {}", token());

        let (status, body) = send(app, ping_request(Some(&auth), r#"{"ip_address":"10.255.255.1"}"#)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": {
                    "source": "internal",
                    "code": "00000",
                    "message": "All ping attempts failed on all ports",
                    "function": "handlePing"
                }
            })
        );
        assert_eq!(connector.ports_called().len(), 9);
    }

    #[tokio::test]
    async fn test_rejected_tokens_never_probe() {
        let connector = ScriptedConnector::always(5, 3);
        let expired = TokenIssuer::new(&secret())
            .sign(&Claims {
                iss: "internal".to_string(),
                kind: None,
                exp: Some(Utc::now().timestamp() as u64 - 60),
                iat: None,
            })
            .unwrap();
        let foreign = TokenIssuer::new(&SecretKey::new("other-secret"))
            .short_lived(None, 1)
            .unwrap();

        let cases = [
            None,
            Some("Bearer".to_string()),
            Some("Bearer not-a-jwt".to_string()),
            Some(format!("Basic {}", token())),
            Some(format!("Bearer {}", expired)),
            Some(format!("Bearer {}", foreign)),
        ];
        for auth in cases {
            let app = router(state(connector.clone()));
            let (status, body) =
                send(app, ping_request(auth.as_deref(), r#"{"ip_address":"8.8.8.8"}"#)).await;

            assert_eq!(status, StatusCode::UNAUTHORIZED, "auth {auth:?}");
            assert_eq!(body, json!({ "error": "Invalid auth token" }));
        }
        assert!(connector.ports_called().is_empty());
    }

    #[tokio::test]
    async fn test_auth_checked_before_body() {
        let app = router(state(ScriptedConnector::new([])));
        let (status, _) = send(app, ping_request(None, "")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_permanent_token_accepted() {
        let connector = ScriptedConnector::always(7, 3);
        let app = router(state(connector));
        let permanent = TokenIssuer::new(&secret()).permanent("monitor").unwrap();

        let (status, body) = send(
            app,
            ping_request(Some(&format!("Bearer {}", permanent)), r#"{"ip_address":"1.1.1.1"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["average_ping_ms"], 7);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = router(state(ScriptedConnector::new([])));
        let (status, body) = send(
            app,
            HttpRequest::get("/nope").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not found" }));
    }

    #[tokio::test]
    async fn test_metrics_exposition() {
        let state = state(ScriptedConnector::new([]));
        let app = router(state.clone());

        app.clone()
            .oneshot(HttpRequest::get("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let resp = app
            .oneshot(HttpRequest::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            state.metrics.content_type()
        );
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains(
            r#"tcping_api_http_requests_total{method="GET",route="/ping",status="200"} 1"#
        ));
    }

    #[tokio::test]
    async fn test_panic_becomes_envelope() {
        async fn boom() -> &'static str {
            panic!("boom")
        }
        let routes = Router::new().route("/boom", get(boom));
        let app = with_layers(routes, state(ScriptedConnector::new([])));

        let (status, body) = send(app, HttpRequest::get("/boom").body(Body::empty()).unwrap()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["message"], "Internal server error");
        assert_eq!(body["error"]["function"], "server/index");
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = router(state(ScriptedConnector::new([])));
        let req = HttpRequest::builder()
            .method(Method::OPTIONS)
            .uri("/ping")
            .header(header::ORIGIN, "https://dashboard.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
            .body(Body::empty())
            .unwrap();

        let resp = app.oneshot(req).await.unwrap();

        assert!(resp.status().is_success());
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
