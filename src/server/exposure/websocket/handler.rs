//! WebSocket upgrade handler and live view loop
//!
//! Each connection follows one collection. It gets:
//!
//! 1. A `view` message rendered from the current snapshot
//! 2. A write loop that forwards server messages to the WebSocket
//! 3. A loop that re-renders on every client message and every new snapshot
//!
//! Closing the socket unsubscribes from the feed before the loop returns, so
//! no view is ever rendered after the client is gone.

use super::protocol::{ClientMessage, ServerMessage};
use super::session::{LiveView, Reply};
use crate::config::CollectionConfig;
use crate::core::feed::Subscription;
use crate::server::exposure::rest::records::admin_collection;
use crate::server::host::ServerHost;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures::SinkExt;
use futures::stream::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

const FEED_CLOSED: &str = "Live updates are no longer available.";

/// WebSocket upgrade handler for GET /ws/{collection}
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(host): State<Arc<ServerHost>>,
    Path(collection): Path<String>,
) -> Response {
    let config = match admin_collection(&host, &collection) {
        Ok(config) => config.clone(),
        Err(e) => return e.into_response(),
    };
    ws.on_upgrade(move |socket| handle_socket(socket, host, config))
}

/// Run one live view until the client leaves or the feed closes
async fn handle_socket(socket: WebSocket, host: Arc<ServerHost>, config: CollectionConfig) {
    let mut subscription = host.store.subscribe(&config.name, &config.order_field);
    let mut view = LiveView::new(config, host.config.pagination.clone());

    let (mut ws_write, mut ws_read) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let collection = subscription.collection().to_string();
    tracing::debug!(collection = %collection, "Live view opened");

    // Write loop: forward ServerMessages to the WebSocket
    let write_collection = collection.clone();
    let write_handle = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if ws_write.send(Message::Text(json.into())).await.is_err() {
                        tracing::debug!(
                            collection = %write_collection,
                            "WebSocket write failed, closing"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        collection = %write_collection,
                        error = %e,
                        "Failed to serialize ServerMessage"
                    );
                }
            }
        }
    });

    let end = run_view(&mut ws_read, &mut view, &mut subscription, &tx).await;

    subscription.unsubscribe();
    drop(tx);
    // Let the write loop flush what is queued, unless the socket is gone
    if tokio::time::timeout(std::time::Duration::from_secs(1), write_handle)
        .await
        .is_err()
    {
        tracing::debug!(collection = %collection, "Write loop did not finish in time");
    }
    tracing::debug!(collection = %collection, reason = ?end, "Live view closed");
}

/// Why a live view stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViewEnd {
    /// The client closed the socket or it failed
    ClientGone,
    /// The feed stopped delivering snapshots
    FeedClosed,
}

/// Render the current snapshot, then re-render on every client message and
/// every new snapshot until the client leaves or the feed closes
async fn run_view<S, E>(
    incoming: &mut S,
    view: &mut LiveView,
    subscription: &mut Subscription,
    tx: &mpsc::UnboundedSender<ServerMessage>,
) -> ViewEnd
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    let collection = subscription.collection().to_string();
    let initial = subscription.current();
    let _ = tx.send(view.render(&initial));

    loop {
        tokio::select! {
            message = incoming.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    handle_client_message(view, subscription, tx, &text);
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::debug!(collection = %collection, "Client closed live view");
                    return ViewEnd::ClientGone;
                }
                Some(Ok(_)) => {
                    // Ping frames are answered by axum; binary frames are ignored
                }
                Some(Err(e)) => {
                    tracing::debug!(collection = %collection, error = %e, "WebSocket read error");
                    return ViewEnd::ClientGone;
                }
            },
            snapshot = subscription.changed() => match snapshot {
                Some(snapshot) => {
                    let _ = tx.send(view.render(&snapshot));
                }
                None => {
                    tracing::warn!(collection = %collection, "Feed closed, ending live view");
                    let _ = tx.send(ServerMessage::Error {
                        message: FEED_CLOSED.to_string(),
                    });
                    return ViewEnd::FeedClosed;
                }
            },
        }
    }
}

/// Process a single client message
fn handle_client_message(
    view: &mut LiveView,
    subscription: &mut Subscription,
    tx: &mpsc::UnboundedSender<ServerMessage>,
    text: &str,
) {
    let msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            let _ = tx.send(ServerMessage::Error {
                message: format!("Invalid message: {}", e),
            });
            return;
        }
    };

    match view.apply(msg) {
        Reply::Render => {
            let snapshot = subscription.current();
            let _ = tx.send(view.render(&snapshot));
        }
        Reply::Send(msg) => {
            let _ = tx.send(msg);
        }
    }
}
