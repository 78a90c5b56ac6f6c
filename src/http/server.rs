//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all gateway handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Drive the full pipeline per request:
//!   routing → preflight short-circuit → cache engine → header policy
//! - Map the failure taxonomy to client statuses

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::cache::{spawn_sweep_task, CacheEngine, CacheStore, GatewayResponse};
use crate::config::GatewayConfig;
use crate::headers::CorsRules;
use crate::http::error::GatewayError;
use crate::http::request::{request_origin, ForwardRequest, RequestIdLayer, X_REQUEST_ID};
use crate::observability::metrics;
use crate::origin::{HealthMonitor, OriginSelector};
use crate::routing::RoutingTable;

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RoutingTable>,
    pub engine: Arc<CacheEngine>,
    pub health: Arc<HealthMonitor>,
    pub max_body_bytes: usize,
}

/// HTTP server for the edge gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    store: Arc<CacheStore>,
}

impl GatewayServer {
    /// Create a new server from loaded configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let table = Arc::new(RoutingTable::from_config(&config));
        let health = Arc::new(HealthMonitor::new(
            config.origins.iter().map(|o| o.name.clone()),
            config.health.degraded_threshold,
        ));
        let store = Arc::new(CacheStore::new());
        let selector = OriginSelector::new(health.clone());
        let engine = Arc::new(CacheEngine::new(store.clone(), selector));

        let state = AppState {
            table,
            engine,
            health,
            max_body_bytes: config.listener.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            store,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway listening");

        let sweep = spawn_sweep_task(
            self.store.clone(),
            self.config.observability.cache_sweep_interval_secs,
            shutdown.resubscribe(),
        );

        let app = self.router;
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await;

        // The sweep task must not outlive the server, even on error.
        sweep.abort();
        served?;

        tracing::info!("Gateway stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// The entry point for every proxied request.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let method_str = method.to_string();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Handling request"
    );

    let route = match state.table.resolve(&method, &path) {
        Ok(route) => route,
        Err(e) => {
            tracing::debug!(request_id = %request_id, path = %path, error = %e, "Routing failed");
            let error = GatewayError::from(e);
            metrics::record_request(&method_str, error.status().as_u16(), "none", start);
            return error.into_response();
        }
    };

    let origin_header = request_origin(request.headers());

    // Preflight probes are answered from configuration alone.
    if let Some(cors) = route.headers.cors() {
        if CorsRules::is_preflight(&method, request.headers()) {
            let response = cors.preflight_response(origin_header.as_deref());
            metrics::record_request(&method_str, response.status.as_u16(), &route.name, start);
            return into_http_response(response);
        }
    }

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            metrics::record_request(&method_str, 413, &route.name, start);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };
    let forward = ForwardRequest::from_parts(&parts, body);

    match state.engine.handle(&route, &forward).await {
        Ok(mut response) => {
            route
                .headers
                .apply(origin_header.as_deref(), &mut response.headers);
            metrics::record_request(&method_str, response.status.as_u16(), &route.name, start);
            into_http_response(response)
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                route = %route.name,
                error = %e,
                "Origin fetch exhausted"
            );
            let error = GatewayError::from(e);
            metrics::record_request(&method_str, error.status().as_u16(), &route.name, start);
            error.into_response()
        }
    }
}

fn into_http_response(response: GatewayResponse) -> Response {
    let mut builder = Response::builder().status(response.status);
    if let Some(headers) = builder.headers_mut() {
        *headers = response.headers;
    }
    builder
        .body(Body::from(response.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
