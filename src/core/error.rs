//! Typed error handling for the exam portal
//!
//! [`PortalError`] is the error every handler returns. Each variant maps to
//! an HTTP status and a stable error code, and renders as
//!
//! ```json
//! { "code": "VALIDATION_ERROR", "message": "All fields are required.", "details": { ... } }
//! ```
//!
//! Collaborators behind trait seams (record store, blob store, identity
//! provider) return `anyhow::Error`; handlers turn those into
//! [`PortalError::Storage`] with a user-facing message and log the cause.

use crate::core::auth::AuthError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

/// A single invalid form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The main error type of the portal
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// Submitted form failed validation; nothing was written
    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    /// Record does not exist
    #[error("{collection} {id} not found")]
    NotFound { collection: String, id: Uuid },

    /// Collection is not served by this portal
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// No valid session
    #[error("{message}")]
    Unauthorized {
        message: String,
        redirect: &'static str,
    },

    /// Session is valid but its role may not enter the route
    #[error("{message}")]
    Forbidden {
        message: String,
        redirect: &'static str,
    },

    /// Request conflicts with existing state (e.g. email already registered)
    #[error("{0}")]
    Conflict(String),

    /// A collaborator failed; the message is safe to show to users
    #[error("{0}")]
    Storage(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Should not happen in normal operation
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl PortalError {
    /// Validation failure on a single field
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        PortalError::Validation {
            fields: vec![FieldError::new(field, message.clone())],
            message,
        }
    }

    /// Validation failure on several fields sharing one message
    pub fn invalid_fields(fields: &[&str], message: impl Into<String>) -> Self {
        let message = message.into();
        PortalError::Validation {
            fields: fields
                .iter()
                .map(|field| FieldError::new(*field, message.clone()))
                .collect(),
            message,
        }
    }

    pub fn not_found(collection: &str, id: Uuid) -> Self {
        PortalError::NotFound {
            collection: collection.to_string(),
            id,
        }
    }

    /// Log a collaborator failure and replace it with a user-facing message
    pub fn storage(message: &str, cause: anyhow::Error) -> Self {
        tracing::error!(error = %cause, "{}", message);
        PortalError::Storage(message.to_string())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            PortalError::Validation { .. } => StatusCode::BAD_REQUEST,
            PortalError::NotFound { .. } | PortalError::UnknownCollection(_) => {
                StatusCode::NOT_FOUND
            }
            PortalError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            PortalError::Forbidden { .. } => StatusCode::FORBIDDEN,
            PortalError::Conflict(_) => StatusCode::CONFLICT,
            PortalError::Storage(_) | PortalError::Config(_) | PortalError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            PortalError::Validation { .. } => "VALIDATION_ERROR",
            PortalError::NotFound { .. } => "NOT_FOUND",
            PortalError::UnknownCollection(_) => "UNKNOWN_COLLECTION",
            PortalError::Unauthorized { .. } => "UNAUTHORIZED",
            PortalError::Forbidden { .. } => "FORBIDDEN",
            PortalError::Conflict(_) => "CONFLICT",
            PortalError::Storage(_) => "STORAGE_ERROR",
            PortalError::Config(_) => "CONFIG_ERROR",
            PortalError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            PortalError::Validation { fields, .. } if !fields.is_empty() => {
                Some(json!({ "fields": fields }))
            }
            PortalError::NotFound { collection, id } => Some(json!({
                "collection": collection,
                "id": id.to_string()
            })),
            PortalError::Unauthorized { redirect, .. } | PortalError::Forbidden { redirect, .. } => {
                Some(json!({ "redirect": redirect }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(code = self.error_code(), "{}", self);
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<AuthError> for PortalError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailInUse => PortalError::Conflict(err.to_string()),
            AuthError::InvalidCredentials => PortalError::Unauthorized {
                message: err.to_string(),
                redirect: crate::core::auth::LOGIN_PATH,
            },
            AuthError::WeakPassword => PortalError::invalid("password", err.to_string()),
            AuthError::InvalidEmail => PortalError::invalid("email", err.to_string()),
        }
    }
}

impl From<serde_yaml::Error> for PortalError {
    fn from(err: serde_yaml::Error) -> Self {
        PortalError::Config(err.to_string())
    }
}

impl From<std::io::Error> for PortalError {
    fn from(err: std::io::Error) -> Self {
        PortalError::Config(err.to_string())
    }
}

/// A specialized Result type for portal operations
pub type PortalResult<T> = Result<T, PortalError>;
