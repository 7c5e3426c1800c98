//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router under `/api`
//! - Gate content writes behind the admin middleware
//! - Wire up middleware (request ID, tracing, CORS, timeout, body limit, metrics)
//! - Serve with client addresses and graceful shutdown

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{DefaultBodyLimit, MatchedPath, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::{admin_auth_middleware, setup_auth_router, AdminGate};
use crate::config::{AppConfig, ServerConfig};
use crate::contact::{self, ContactValidator};
use crate::http::content;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, X_REQUEST_ID};
use crate::identity::IdentityProvider;
use crate::lifecycle::shutdown_signal;
use crate::mail::Mailer;
use crate::observability::metrics;
use crate::security::RateLimiter;
use crate::storage::Store;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Store,
    pub identity: Arc<dyn IdentityProvider>,
    pub admin: AdminGate,
    pub limiter: Arc<dyn RateLimiter>,
    pub validator: Arc<ContactValidator>,
    /// `None` when no SMTP relay is configured.
    pub mailer: Option<Arc<dyn Mailer>>,
}

pub struct HttpServer {
    router: Router,
    config: Arc<AppConfig>,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        let router = Self::build_router(&config.server, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        let admin = content::admin_router().route_layer(middleware::from_fn_with_state(
            state.admin.clone(),
            admin_auth_middleware,
        ));

        // Admin routes first so shared paths keep the public 405 fallback.
        let api = Router::new()
            .route("/health", get(health))
            .route("/contact", post(contact::handlers::submit))
            .merge(setup_auth_router())
            .merge(admin)
            .merge(content::public_router());

        let stack = ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(propagate_request_id_layer())
            .layer(cors_layer(&config.cors_origins))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)));

        Router::new()
            .nest("/api", api)
            .layer(DefaultBodyLimit::max(config.max_body_bytes))
            .layer(middleware::from_fn(track_metrics))
            .layer(stack)
            .with_state(state)
    }

    /// Run until Ctrl+C or SIGTERM.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service = %self.config.server.service_name,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

fn request_span(request: &Request) -> tracing::Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": state.config.server.service_name,
        "time": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}
