//! Live list views over WebSocket
//!
//! A client opens one socket per list. The server renders the first page
//! from the current snapshot and pushes a fresh page whenever the collection
//! changes or the client changes the view inputs.
//!
//! # Architecture
//!
//! ```text
//! Client ──ws──▶ /ws/{collection} ──▶ ws_handler() ──▶ LiveView
//!                                                         ▲
//!       RecordStore ──▶ FeedHub ──watch──▶ Subscription ──┘ ──▶ view ──▶ Client
//! ```
//!
//! See [`protocol`] for the message format.

mod handler;
pub mod protocol;
pub mod session;

use crate::server::guard::require_admin;
use crate::server::host::ServerHost;
use anyhow::Result;
use axum::{Router, middleware, routing::get};
use std::sync::Arc;

pub use session::LiveView;

/// WebSocket live view exposure
///
/// # Example
///
/// ```rust,ignore
/// let host = Arc::new(ServerBuilder::new().in_memory().build_host()?);
///
/// let rest_router = RestExposure::build_router(host.clone(), vec![])?;
/// let ws_router = WebSocketExposure::build_router(host)?;
///
/// let app = rest_router.merge(ws_router);
/// ```
pub struct WebSocketExposure;

impl WebSocketExposure {
    /// Build the WebSocket router from a host
    ///
    /// Live views belong to the admin console and sit behind the admin guard.
    pub fn build_router(host: Arc<ServerHost>) -> Result<Router> {
        let router = Router::new()
            .route("/ws/{collection}", get(handler::ws_handler))
            .route_layer(middleware::from_fn_with_state(host.clone(), require_admin))
            .with_state(host);

        Ok(router)
    }
}
