//! # HTTP Server Module
//!
//! Thin transport over the orchestrator. It only (de)serializes envelopes
//! and maps `error.code` to a status.
//!
//! # Endpoints
//!
//! - `POST /query`
//! - `GET /health`
//! - `GET /metrics`

pub mod config;
pub mod query_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use query_routes::{status_for, HealthResponse};
pub use server::HttpServer;
