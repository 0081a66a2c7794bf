//! Path-embedded HTTP forward proxy library.

pub mod config;
pub mod error;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resolve;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use forward::ForwardEngine;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resolve::{resolve_target, TargetUrl};
