//! HTTP front door: receives GitHub webhooks and hands them to the relay.
//!
//! Routes:
//! - `POST /github`: webhook deliveries
//! - `GET /health`: liveness and active feeds

pub mod reload;
pub mod server;

pub use {
    reload::{reload_config, watch_config},
    server::{AppState, build_app, serve, status_for},
};
