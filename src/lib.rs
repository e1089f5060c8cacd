//! # release-monitor-gateway
//!
//! Incremental state synchronization for a release monitoring dashboard.
//!
//! Upstream pushes a stream of small events (service ordering, per-service
//! snapshots, version changes, edits, deletions, resets). The gateway folds
//! them, one at a time, into a single consistent model of every monitored
//! service, derives the "update available / approved / skipped" flags the
//! dashboard renders, and fans applied events out to WebSocket clients.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)          Upstream event transport
//!     │                                        │
//!     ├── REST Handlers (api/)  ◄──────────────┤
//!     ├── WS Handler (ws/)      ◄──────────────┘
//!     │
//!     ├── MonitorService (service/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── MonitorStore (domain/)
//!     └── reducer + classifier (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;

use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::config::GatewayConfig;
use crate::ws::handler::ws_handler;

/// Assembles the REST and WebSocket routes with the HTTP middleware stack.
pub fn build_app(state: AppState, config: &GatewayConfig) -> Router {
    let mut app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .with_state(state);

    if config.request_timeout_secs > 0 {
        app = app.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ));
    }
    if config.cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }
    app.layer(TraceLayer::new_for_http())
}
