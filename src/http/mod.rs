//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, routes)
//!     → request.rs (request ID)
//!     → access.rs (prefix / direct-access decision)
//!     → resolve (embedded target → TargetUrl)
//!     → forward (origin round trip, streamed relay)
//!     → Send to client
//! ```

pub mod access;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
