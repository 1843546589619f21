//! # api-adapters
//!
//! Inbound adapters of the forum backend.
//!
//! - [`metrics`]: Prometheus registry shared by every transport.
//! - `web` (feature `web-axum`): the JSON HTTP API under `/api`.

pub mod metrics;

#[cfg(feature = "web-axum")]
pub mod web;

pub use metrics::Metrics;
