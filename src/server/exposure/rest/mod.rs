//! REST API exposure for the portal
//!
//! The REST exposure consumes a `ServerHost` and produces an Axum `Router`
//! with three route classes:
//! - public: health checks, authentication, stored files
//! - admin console (`/api/...`), behind the admin guard
//! - user dashboard (`/dashboard/...`), behind the user guard

pub mod auth;
pub mod banners;
pub mod dashboard;
pub mod notes;
pub mod questions;
pub mod records;
pub mod user;

use super::super::guard::{require_admin, require_session, require_user};
use super::super::host::ServerHost;
use crate::core::error::PortalError;
use anyhow::Result;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use serde_json::{Value, json};
use std::sync::Arc;

/// REST API exposure implementation
pub struct RestExposure;

impl RestExposure {
    /// Build the REST router from a host
    ///
    /// # Arguments
    ///
    /// * `host` - The server host containing all portal state
    /// * `custom_routes` - Additional custom routes to merge
    pub fn build_router(host: Arc<ServerHost>, custom_routes: Vec<Router>) -> Result<Router> {
        let mut app = Self::health_routes()
            .merge(Self::auth_routes(host.clone()))
            .merge(Self::admin_routes(host.clone()))
            .merge(Self::user_routes(host.clone()))
            .merge(Self::file_routes(host));

        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        Ok(app)
    }

    /// Build health check routes
    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    /// Health check endpoint handler
    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "exam-portal"
        }))
    }

    fn auth_routes(host: Arc<ServerHost>) -> Router {
        let session_routes = Router::new()
            .route("/auth/me", get(auth::me))
            .route_layer(middleware::from_fn_with_state(host.clone(), require_session));

        Router::new()
            .route("/auth/signup", post(auth::sign_up))
            .route("/auth/login", post(auth::login))
            .route("/auth/logout", post(auth::logout))
            .merge(session_routes)
            .with_state(host)
    }

    fn admin_routes(host: Arc<ServerHost>) -> Router {
        let upload_limit = DefaultBodyLimit::max(host.config.server.max_upload_bytes);

        Router::new()
            .route("/api/dashboard", get(dashboard::summary))
            .route("/api/notes/links", post(notes::create_link))
            .route(
                "/api/notes/files",
                post(notes::upload_file).layer(upload_limit),
            )
            .route(
                "/api/notes/{id}",
                get(notes::get_note)
                    .put(notes::update_note)
                    .delete(notes::delete_note),
            )
            .route(
                "/api/papers/{paper_id}/questions",
                get(questions::list_questions).post(questions::create_question),
            )
            .route(
                "/api/papers/{paper_id}/questions/{id}",
                get(questions::get_question)
                    .put(questions::update_question)
                    .delete(questions::delete_question),
            )
            .route("/api/banners/{id}/toggle", post(banners::toggle_banner))
            .route(
                "/api/{collection}",
                get(records::list_records).post(records::create_record),
            )
            .route(
                "/api/{collection}/{id}",
                get(records::get_record)
                    .put(records::update_record)
                    .delete(records::delete_record),
            )
            .route_layer(middleware::from_fn_with_state(host.clone(), require_admin))
            .with_state(host)
    }

    fn user_routes(host: Arc<ServerHost>) -> Router {
        Router::new()
            .route("/dashboard/profile", get(user::profile))
            .route("/dashboard/{collection}", get(user::list_visible))
            .route_layer(middleware::from_fn_with_state(host.clone(), require_user))
            .with_state(host)
    }

    fn file_routes(host: Arc<ServerHost>) -> Router {
        Router::new()
            .route("/files/{*path}", get(Self::download))
            .with_state(host)
    }

    /// Serve an uploaded file
    async fn download(
        State(host): State<Arc<ServerHost>>,
        Path(path): Path<String>,
    ) -> Result<Response, PortalError> {
        let bytes = host
            .blobs
            .download(&path)
            .await
            .map_err(|e| PortalError::storage("Failed to load file.", e))?;

        Ok(match bytes {
            Some(bytes) => (
                [(header::CONTENT_TYPE, "application/octet-stream")],
                bytes,
            )
                .into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        })
    }
}
