//! Live view message protocol
//!
//! Defines the JSON messages exchanged between a live list view and the server.
//!
//! ## Client → Server Messages
//!
//! ```json
//! {"type": "set_filter", "text": "physics"}
//! {"type": "set_sort", "sort": "examDateAsc"}
//! {"type": "set_page", "page": 3}
//! {"type": "set_page_size", "page_size": 25}
//! {"type": "set_status", "status": "active"}
//! {"type": "ping"}
//! ```
//!
//! ## Server → Client Messages
//!
//! ```json
//! // Current page, sent for the first snapshot and after every change
//! {"type": "view", "collection": "exams", "filter": "", "sort": "newest",
//!  "status": "all", "data": [...], "pagination": {...}}
//!
//! {"type": "pong"}
//! {"type": "error", "message": "Page size must be one of [10, 25, 30]"}
//! ```

use crate::core::query::PaginationMeta;
use crate::core::view::FlagFilter;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Change the free-text filter
    SetFilter { text: String },
    /// Change the sort key (wire name)
    SetSort { sort: String },
    /// Go to a page
    SetPage { page: usize },
    /// Change the page size
    SetPageSize { page_size: usize },
    /// Change the active/inactive filter
    SetStatus { status: String },
    /// Keepalive ping
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The page to display
    View {
        collection: String,
        filter: String,
        sort: String,
        status: FlagFilter,
        data: Vec<Value>,
        pagination: PaginationMeta,
    },
    /// Keepalive response
    Pong,
    /// Error message
    Error { message: String },
}
