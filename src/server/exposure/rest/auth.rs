//! Sign-up, sign-in and sign-out
//!
//! Every session answer carries the path the client should land on:
//! `/dashboard` for users and `/` for admins.

use crate::core::auth::{AuthContext, AuthError, LOGIN_PATH, Role, Session, landing_path};
use crate::core::error::{PortalError, PortalResult};
use crate::core::validation::{LoginForm, SignUpForm};
use crate::server::guard::bearer_token;
use crate::server::host::ServerHost;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Answer to a successful sign-up or sign-in
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub user: Value,
    pub role: Role,
    pub redirect: &'static str,
}

impl SessionResponse {
    fn new(session: Session, role: Role) -> Self {
        Self {
            user: json!({
                "id": session.user_id,
                "email": session.email,
                "displayName": session.display_name,
            }),
            token: session.token,
            role,
            redirect: landing_path(Some(role)),
        }
    }
}

/// Caller mistakes reported by the identity provider keep their meaning;
/// anything else is a provider failure
fn identity_error(message: &str, err: anyhow::Error) -> PortalError {
    match err.downcast::<AuthError>() {
        Ok(auth) => auth.into(),
        Err(err) => PortalError::storage(message, err),
    }
}

/// POST /auth/signup
pub async fn sign_up(
    State(host): State<Arc<ServerHost>>,
    Json(form): Json<SignUpForm>,
) -> PortalResult<(StatusCode, Json<SessionResponse>)> {
    form.validate()?;

    let session = host
        .identity
        .sign_up(form.email.trim(), &form.password, form.display_name())
        .await
        .map_err(|e| identity_error("Failed to create account.", e))?;

    host.write_profile(session.user_id, &session.email, form.display_name(), Role::User)
        .await?;

    tracing::info!(user_id = %session.user_id, "User signed up");
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse::new(session, Role::User)),
    ))
}

/// POST /auth/login
///
/// Accounts whose profile has no usable role are signed straight back out.
pub async fn login(
    State(host): State<Arc<ServerHost>>,
    Json(form): Json<LoginForm>,
) -> PortalResult<Json<SessionResponse>> {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return Err(PortalError::invalid_fields(
            &["email", "password"],
            "Email and password are required.",
        ));
    }

    let session = host
        .identity
        .sign_in(&form.email, &form.password)
        .await
        .map_err(|e| identity_error("Failed to sign in.", e))?;

    let role = host
        .profile(&session.user_id)
        .await?
        .and_then(|profile| Role::parse(&profile.text("role")));

    let Some(role) = role else {
        tracing::warn!(user_id = %session.user_id, "Sign-in without a role");
        host.identity
            .sign_out(&session.token)
            .await
            .map_err(|e| identity_error("Failed to sign in.", e))?;
        return Err(PortalError::Unauthorized {
            message: "Your account has no role assigned.".to_string(),
            redirect: LOGIN_PATH,
        });
    };

    tracing::info!(user_id = %session.user_id, role = role.as_str(), "User signed in");
    Ok(Json(SessionResponse::new(session, role)))
}

/// POST /auth/logout
pub async fn logout(
    State(host): State<Arc<ServerHost>>,
    headers: HeaderMap,
) -> PortalResult<StatusCode> {
    if let Some(token) = bearer_token(&headers) {
        host.identity
            .sign_out(token)
            .await
            .map_err(|e| identity_error("Failed to sign out.", e))?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me
pub async fn me(
    State(host): State<Arc<ServerHost>>,
    Extension(context): Extension<AuthContext>,
) -> PortalResult<Json<Value>> {
    let AuthContext::Authenticated {
        user_id,
        email,
        role,
    } = context
    else {
        return Err(PortalError::Internal("guarded route without a session".to_string()));
    };

    let profile = host.profile(&user_id).await?;
    Ok(Json(json!({
        "id": user_id,
        "email": email,
        "role": role,
        "redirect": landing_path(role),
        "profile": profile,
    })))
}
