//! Server module for building the portal's HTTP server
//!
//! This module provides a `ServerBuilder` that wires the collaborators into a
//! `ServerHost` and exposes it through:
//! - REST routes for the admin console, the user dashboard and authentication
//! - WebSocket live list views

pub mod builder;
pub mod exposure;
pub mod guard;
pub mod host;

pub use builder::ServerBuilder;
pub use exposure::{RestExposure, WebSocketExposure};
pub use host::ServerHost;
