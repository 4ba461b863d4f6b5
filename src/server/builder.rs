//! ServerBuilder for fluent API to build the portal server

use super::exposure::{RestExposure, WebSocketExposure};
use super::host::ServerHost;
use crate::config::PortalConfig;
use crate::core::auth::IdentityProvider;
use crate::core::blob::BlobStore;
use crate::core::events::{EventBus, run_audit_loop};
use crate::core::feed::FeedHub;
use crate::core::store::RecordStore;
use crate::storage::{InMemoryBlobStore, InMemoryIdentityProvider, InMemoryRecordStore};
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builder for the portal server
///
/// # Example
///
/// ```ignore
/// ServerBuilder::new()
///     .with_config(PortalConfig::from_yaml_file("portal.yaml")?)
///     .in_memory()
///     .serve("127.0.0.1:3000")
///     .await?;
/// ```
pub struct ServerBuilder {
    config: Option<PortalConfig>,
    store: Option<Arc<dyn RecordStore>>,
    blobs: Option<Arc<dyn BlobStore>>,
    identity: Option<Arc<dyn IdentityProvider>>,
    custom_routes: Vec<Router>,
    event_bus: Option<EventBus>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            config: None,
            store: None,
            blobs: None,
            identity: None,
            custom_routes: Vec::new(),
            event_bus: None,
        }
    }

    /// Set the portal configuration (defaults to [`PortalConfig::default_config`])
    pub fn with_config(mut self, config: PortalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the record store (required)
    pub fn with_record_store(mut self, store: impl RecordStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Set the blob store (required)
    pub fn with_blob_store(mut self, blobs: impl BlobStore + 'static) -> Self {
        self.blobs = Some(Arc::new(blobs));
        self
    }

    /// Set the identity provider (required)
    pub fn with_identity_provider(mut self, identity: impl IdentityProvider + 'static) -> Self {
        self.identity = Some(Arc::new(identity));
        self
    }

    /// Enable the event bus carrying record mutations
    ///
    /// # Arguments
    ///
    /// * `capacity` - Buffer size for the broadcast channel (recommended: 1024)
    pub fn with_event_bus(mut self, capacity: usize) -> Self {
        self.event_bus = Some(EventBus::new(capacity));
        self
    }

    /// Fill every missing collaborator with its in-memory implementation
    ///
    /// The in-memory record store publishes into the builder's event bus,
    /// which is created from the `feed` configuration when not set.
    pub fn in_memory(mut self) -> Self {
        let capacity = self
            .config
            .as_ref()
            .map(|config| config.feed.event_capacity)
            .unwrap_or(1024);
        let event_bus = self
            .event_bus
            .take()
            .unwrap_or_else(|| EventBus::new(capacity));

        if self.store.is_none() {
            let store = InMemoryRecordStore::with_channels(FeedHub::new(), event_bus.clone());
            self.store = Some(Arc::new(store));
        }
        if self.blobs.is_none() {
            self.blobs = Some(Arc::new(InMemoryBlobStore::default()));
        }
        if self.identity.is_none() {
            self.identity = Some(Arc::new(InMemoryIdentityProvider::new()));
        }
        self.event_bus = Some(event_bus);
        self
    }

    /// Add custom routes to the server
    ///
    /// # Example
    ///
    /// ```ignore
    /// let extra = Router::new().route("/version", get(|| async { "1.0" }));
    ///
    /// ServerBuilder::new()
    ///     .in_memory()
    ///     .with_custom_routes(extra)
    ///     .build()?;
    /// ```
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the host shared by every exposure
    pub fn build_host(mut self) -> Result<ServerHost> {
        let config = self.config.take().unwrap_or_default();

        let store = self.store.take().ok_or_else(|| {
            anyhow::anyhow!("RecordStore is required. Call .with_record_store() or .in_memory()")
        })?;
        let blobs = self.blobs.take().ok_or_else(|| {
            anyhow::anyhow!("BlobStore is required. Call .with_blob_store() or .in_memory()")
        })?;
        let identity = self.identity.take().ok_or_else(|| {
            anyhow::anyhow!(
                "IdentityProvider is required. Call .with_identity_provider() or .in_memory()"
            )
        })?;

        let mut host = ServerHost::from_builder_components(config, store, blobs, identity)?;

        // Attach event bus if configured
        if let Some(event_bus) = self.event_bus.take() {
            host = host.with_event_bus(event_bus);
        }

        Ok(host)
    }

    /// Build the final router (REST and live views)
    pub fn build(mut self) -> Result<Router> {
        let custom_routes = std::mem::take(&mut self.custom_routes);
        let host = Arc::new(self.build_host()?);
        Self::router(host, custom_routes)
    }

    /// Expose a host through REST and WebSocket with tracing and CORS layers
    pub fn router(host: Arc<ServerHost>, custom_routes: Vec<Router>) -> Result<Router> {
        let rest_router = RestExposure::build_router(host.clone(), custom_routes)?;
        let ws_router = WebSocketExposure::build_router(host)?;

        Ok(rest_router
            .merge(ws_router)
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Create the configured admin accounts
    /// - Start the audit log of record mutations
    /// - Bind to the provided address and serve requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(mut self, addr: &str) -> Result<()> {
        let custom_routes = std::mem::take(&mut self.custom_routes);
        let host = Arc::new(self.build_host()?);

        host.seed_admins().await?;
        if let Some(event_bus) = host.event_bus() {
            tokio::spawn(run_audit_loop(event_bus.subscribe()));
        }

        let app = Self::router(host, custom_routes)?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
