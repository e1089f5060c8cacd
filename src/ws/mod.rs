//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` pushes applied events and approval
//! requests to subscribed dashboards, and accepts the same commands as
//! the REST surface.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
