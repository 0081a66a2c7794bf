//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handlers produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID (x-request-id) flows through every request log event
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
