//! Forwarding engine subsystem.
//!
//! # Data Flow
//! ```text
//! inbound Request<Body> + TargetUrl
//!     → headers.rs (strip identity/infrastructure/hop-by-hop, force identity encoding)
//!     → engine.rs (reqwest dispatch: streamed body, no redirects, fixed timeout)
//!     → engine.rs (status verbatim, filtered headers)
//!     → redirect.rs (Location → {prefix}/<absolute-url>)
//!     → engine.rs (range passthrough, content-type fallback)
//!     → body.rs (origin body relayed in bounded chunks)
//!     → Response<Body>
//! ```
//!
//! # Design Decisions
//! - One attempt per request; failures surface immediately
//! - No redirect is ever followed by the transport
//! - Nothing is buffered beyond one origin read

pub mod body;
pub mod engine;
pub mod error;
pub mod headers;
pub mod redirect;

pub use engine::{ForwardEngine, DEFAULT_CONTENT_TYPE};
pub use error::ForwardError;
pub use headers::HeaderPolicy;
