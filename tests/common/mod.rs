//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::{Path, RawQuery},
    http::{HeaderMap, Method, Response, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use forward_proxy::config::ProxyConfig;
use forward_proxy::{HttpServer, Shutdown};
use futures_util::stream;
use tokio::net::TcpListener;

pub const LARGE_BODY_BYTES: usize = 8 * 1024 * 1024;

/// `/trickle` sends this many chunks, `TRICKLE_INTERVAL` apart.
pub const TRICKLE_CHUNKS: usize = 6;
pub const TRICKLE_CHUNK_BYTES: usize = 10;
pub const TRICKLE_INTERVAL: Duration = Duration::from_millis(400);

/// Start an origin server with fixed behaviours on an ephemeral port.
pub async fn start_origin() -> SocketAddr {
    let app = Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", get(status))
        .route("/redirect/absolute", get(|| async {
            (StatusCode::MOVED_PERMANENTLY, [("location", "https://b.example/x")])
        }))
        .route("/redirect/relative", get(|| async {
            (StatusCode::FOUND, [("location", "/landing")], "moved")
        }))
        .route("/range", get(range))
        .route("/untyped", get(|| async { Response::new(Body::from("raw bytes")) }))
        .route("/infrastructure", get(|| async {
            (
                [
                    ("cf-ray", "8a1b2c3d"),
                    ("cdn-loop", "cloudflare"),
                    ("x-forwarded-for", "203.0.113.9"),
                    ("content-encoding", "identity"),
                    ("x-origin", "kept"),
                ],
                "payload",
            )
        }))
        .route("/large", get(large))
        .route("/trickle", get(trickle))
        .route("/slow", get(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            "late"
        }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn echo(
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in &headers {
        let value = value.to_str().unwrap_or_default();
        seen.entry(name.as_str().to_string())
            .and_modify(|v| {
                v.push_str(", ");
                v.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    Json(serde_json::json!({
        "method": method.as_str(),
        "query": query,
        "headers": seen,
        "body_len": body.len(),
    }))
}

async fn status(Path(code): Path<u16>) -> impl IntoResponse {
    (StatusCode::from_u16(code).unwrap(), format!("status {}", code))
}

async fn range(headers: HeaderMap) -> Response<Body> {
    let full: Vec<u8> = (0..100u8).collect();
    if headers.contains_key("range") {
        Response::builder()
            .status(StatusCode::PARTIAL_CONTENT)
            .header("content-range", "bytes 0-9/100")
            .header("content-type", "application/octet-stream")
            .body(Body::from(full[..10].to_vec()))
            .unwrap()
    } else {
        Response::new(Body::from(full))
    }
}

async fn large() -> Response<Body> {
    let block = Bytes::from(vec![b'x'; 64 * 1024]);
    let blocks = LARGE_BODY_BYTES / block.len();
    let body = stream::iter((0..blocks).map(move |_| Ok::<_, std::io::Error>(block.clone())));
    Response::new(Body::from_stream(body))
}

async fn trickle() -> Response<Body> {
    let body = stream::unfold(0usize, |sent| async move {
        if sent == TRICKLE_CHUNKS {
            return None;
        }
        if sent > 0 {
            tokio::time::sleep(TRICKLE_INTERVAL).await;
        }
        let chunk = Bytes::from(vec![b't'; TRICKLE_CHUNK_BYTES]);
        Some((Ok::<_, std::io::Error>(chunk), sent + 1))
    });
    Response::new(Body::from_stream(body))
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Start the proxy on an ephemeral port.
pub async fn start_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Test client: redirects surface as-is, environment proxies ignored.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
