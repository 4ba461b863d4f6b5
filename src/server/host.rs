//! Server host shared by every exposure
//!
//! This module provides a `ServerHost` structure that contains all portal state
//! needed to serve the API: configuration and the three collaborators (record
//! store, blob store, identity provider). REST handlers and the live view
//! socket both receive it as `State<Arc<ServerHost>>`.

use crate::config::{CollectionConfig, PortalConfig, collections};
use crate::core::auth::{AuthContext, IdentityProvider, Role};
use crate::core::blob::BlobStore;
use crate::core::error::{PortalError, PortalResult};
use crate::core::events::EventBus;
use crate::core::record::{CREATED_AT, Fields, Record};
use crate::core::store::RecordStore;
use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Host context containing all portal state
///
/// # Example
///
/// ```rust,ignore
/// let host = Arc::new(ServerBuilder::new().in_memory().build_host()?);
/// host.seed_admins().await?;
///
/// let rest_app = RestExposure::build_router(host.clone(), vec![])?;
/// let live_app = WebSocketExposure::build_router(host)?;
/// ```
pub struct ServerHost {
    /// Portal configuration
    pub config: Arc<PortalConfig>,

    /// Document store for every collection
    pub store: Arc<dyn RecordStore>,

    /// File storage for uploaded notes
    pub blobs: Arc<dyn BlobStore>,

    /// Accounts and sessions
    pub identity: Arc<dyn IdentityProvider>,

    /// Optional event bus carrying record mutations
    pub event_bus: Option<Arc<EventBus>>,
}

impl ServerHost {
    /// Build the host from builder components
    ///
    /// Fails when the configuration does not validate.
    pub fn from_builder_components(
        config: PortalConfig,
        store: Arc<dyn RecordStore>,
        blobs: Arc<dyn BlobStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config: Arc::new(config),
            store,
            blobs,
            identity,
            event_bus: None,
        })
    }

    /// Set the event bus the store publishes mutations to
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(Arc::new(event_bus));
        self
    }

    /// Get a reference to the event bus (if configured)
    pub fn event_bus(&self) -> Option<&Arc<EventBus>> {
        self.event_bus.as_ref()
    }

    /// Configuration of a collection served by the portal
    pub fn collection(&self, name: &str) -> PortalResult<&CollectionConfig> {
        self.config
            .collection(name)
            .ok_or_else(|| PortalError::UnknownCollection(name.to_string()))
    }

    /// Profile record of a user, if one was written
    pub async fn profile(&self, user_id: &Uuid) -> PortalResult<Option<Record>> {
        self.store
            .get(collections::USERS, user_id)
            .await
            .map_err(|e| PortalError::storage("Failed to load profile.", e))
    }

    /// Resolve the auth context behind a bearer token
    ///
    /// Unknown tokens resolve to [`AuthContext::Anonymous`]. The role is read
    /// from the user's profile; a missing profile or unknown role is `None`.
    pub async fn resolve_context(&self, token: Option<&str>) -> PortalResult<AuthContext> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(AuthContext::Anonymous);
        };

        let session = self
            .identity
            .session(token)
            .await
            .map_err(|e| PortalError::storage("Failed to load session.", e))?;
        let Some(session) = session else {
            return Ok(AuthContext::Anonymous);
        };

        let role = self
            .profile(&session.user_id)
            .await?
            .and_then(|profile| Role::parse(&profile.text("role")));

        Ok(AuthContext::Authenticated {
            user_id: session.user_id,
            email: session.email,
            role,
        })
    }

    /// Write the profile created for every new account
    pub async fn write_profile(
        &self,
        user_id: Uuid,
        email: &str,
        display_name: Option<&str>,
        role: Role,
    ) -> PortalResult<Record> {
        let profile = json!({
            "uid": user_id.to_string(),
            "email": email,
            "role": role.as_str(),
            "displayName": display_name.unwrap_or_default(),
            CREATED_AT: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        let fields: Fields = profile.as_object().cloned().unwrap_or_default();

        self.store
            .set(collections::USERS, user_id, fields, false)
            .await
            .map_err(|e| PortalError::storage("Failed to save profile.", e))
    }

    /// Create the configured admin accounts that do not exist yet
    ///
    /// Existing accounts are signed in and promoted to admin.
    pub async fn seed_admins(&self) -> Result<()> {
        for admin in &self.config.admins {
            let display_name = admin.display_name.as_deref();
            let session = match self
                .identity
                .sign_up(&admin.email, &admin.password, display_name)
                .await
            {
                Ok(session) => session,
                Err(_) => self.identity.sign_in(&admin.email, &admin.password).await?,
            };

            self.write_profile(session.user_id, &session.email, display_name, Role::Admin)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            self.identity.sign_out(&session.token).await?;

            tracing::info!(email = %admin.email, "Admin account ready");
        }
        Ok(())
    }
}
