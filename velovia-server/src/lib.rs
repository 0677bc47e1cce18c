//! HTTP transport for the velovia routing engine.
//!
//! The binary reads a TOML configuration, builds the engine once at
//! startup, and serves it over a small JSON API. A failed engine build
//! does not abort the process: the server starts degraded and reports
//! the failure through `/health` until it is restarted with good data.

pub mod api;
pub mod config;
pub mod error;
