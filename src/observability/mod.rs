//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Logger component (bootstrap phase 2):
//!     → logging.rs installs the global tracing subscriber
//!
//! Bootstrap sequencer:
//!     → metrics.rs (per-component durations, failures, outcome)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Nothing logs through tracing before the Logger component is up
//! - Metrics are cheap no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
