//! API exposure modules for different protocols
//!
//! Each exposure type consumes a `ServerHost` and produces a Router for that protocol.

pub mod rest;
pub mod websocket;

// Re-export for convenience
pub use rest::RestExposure;
pub use websocket::WebSocketExposure;
