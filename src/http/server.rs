//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Configure HTTP/1.1 and HTTP/2 support
//! - Wire up middleware (request ID, tracing, body limit)
//! - Bind server to listener (plain or TLS)
//! - Resolve embedded targets and dispatch to the forwarding engine
//! - Observability (metrics, correlation IDs)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, on, MethodFilter},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{AccessMode, ProxyConfig, TlsConfig};
use crate::error::ProxyError;
use crate::forward::{ForwardEngine, ForwardError};
use crate::http::access::{classify_path, is_forwarded_method, PathAccess};
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::lifecycle::shutdown::wait as wait_for_shutdown;
use crate::net::tls::load_tls_config;
use crate::observability::metrics;
use crate::resolve::resolve_target;

/// Grace period for in-flight relays when serving TLS.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ForwardEngine>,
    pub route_prefix: Arc<str>,
    pub access_mode: AccessMode,
}

/// HTTP server for the forward proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ForwardError> {
        let engine = Arc::new(ForwardEngine::new(&config.forwarding)?);

        let state = AppState {
            engine,
            route_prefix: Arc::from(config.forwarding.route_prefix.as_str()),
            access_mode: config.forwarding.access_mode,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let forwarded = MethodFilter::GET
            .or(MethodFilter::POST)
            .or(MethodFilter::PUT)
            .or(MethodFilter::DELETE)
            .or(MethodFilter::PATCH);
        let proxy_route = format!("{}/{{*target}}", config.forwarding.route_prefix);

        Router::new()
            .route("/healthz", get(health_check))
            .route(&proxy_route, on(forwarded, proxy_handler))
            .fallback(fallback_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(RequestBodyLimitLayer::new(config.forwarding.max_body_bytes)),
            )
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server with TLS termination on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: &TlsConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let rustls = load_tls_config(tls).await?;
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            wait_for_shutdown(shutdown).await;
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

async fn health_check() -> &'static str {
    "OK"
}

/// `{prefix}/{*target}`.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let path = request.uri().path().to_string();
    match classify_path(&path, &state.route_prefix, state.access_mode) {
        PathAccess::Target(raw) => relay(&state, raw, request).await,
        PathAccess::Forbidden => reject(&request),
    }
}

/// Everything the proxy route does not match: `/`, a bare prefix, and
/// non-prefixed paths.
async fn fallback_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let path = request.uri().path().to_string();
    match classify_path(&path, &state.route_prefix, state.access_mode) {
        PathAccess::Target(_) if !is_forwarded_method(request.method()) => {
            StatusCode::METHOD_NOT_ALLOWED.into_response()
        }
        PathAccess::Target(raw) => relay(&state, raw, request).await,
        PathAccess::Forbidden => reject(&request),
    }
}

fn reject(request: &Request<Body>) -> Response {
    tracing::warn!(
        request_id = %request_id(request),
        method = %request.method(),
        path = %request.uri().path(),
        "Direct access rejected"
    );
    ProxyError::DisallowedAccess.into_response()
}

/// Resolve the embedded target and forward the request to it.
async fn relay(state: &AppState, raw: &str, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(&request);
    let method = request.method().clone();

    let target = match resolve_target(raw, request.uri().query()) {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!(request_id = %request_id, method = %method, raw = raw, error = %e, "Rejected target URL");
            let err = ProxyError::from(e);
            metrics::record_request(method.as_str(), err.status().as_u16(), "rejected", start);
            return err.into_response();
        }
    };

    tracing::debug!(request_id = %request_id, method = %method, url = %target, "Forwarding request");

    match state.engine.forward(request, &target).await {
        Ok(response) => {
            let status = response.status();
            tracing::info!(
                request_id = %request_id,
                method = %method,
                url = %target,
                status = status.as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Relaying origin response"
            );
            metrics::record_request(method.as_str(), status.as_u16(), "forwarded", start);
            response
        }
        Err(e) => {
            let kind = e.kind();
            tracing::error!(
                request_id = %request_id,
                method = %method,
                url = %target,
                kind = kind,
                error = %e,
                cause = ?std::error::Error::source(&e),
                "Origin request failed"
            );
            let err = ProxyError::from(e);
            metrics::record_request(method.as_str(), err.status().as_u16(), kind, start);
            err.into_response()
        }
    }
}
