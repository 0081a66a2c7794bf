//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → plain: tokio TcpListener handed to axum::serve
//!     → TLS:   tls.rs (rustls config) handed to axum_server::bind_rustls
//!     → Hand off to HTTP layer
//! ```

pub mod tls;
