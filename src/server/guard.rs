//! Route guard middleware
//!
//! Every protected route resolves the caller's [`AuthContext`] from the
//! `Authorization: Bearer <token>` header (or a `?token=` query parameter,
//! which browsers need for WebSocket upgrades), runs the matching
//! [`RouteGuard`] and either forwards the request with the context attached
//! as an extension or answers with the redirect target.

use crate::core::auth::{AuthContext, GuardDecision, LOGIN_PATH, RouteGuard};
use crate::core::error::{PortalError, PortalResult};
use crate::server::host::ServerHost;
use axum::extract::{Query, Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Token from the `Authorization` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Token carried by a request, header first then query string
pub fn request_token(req: &Request) -> Option<String> {
    if let Some(token) = bearer_token(req.headers()) {
        return Some(token.to_string());
    }
    Query::<TokenQuery>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(query)| query.token)
}

/// Admin console routes
pub async fn require_admin(
    State(host): State<Arc<ServerHost>>,
    req: Request,
    next: Next,
) -> PortalResult<Response> {
    guard(RouteGuard::Admin, host, req, next).await
}

/// User dashboard routes
pub async fn require_user(
    State(host): State<Arc<ServerHost>>,
    req: Request,
    next: Next,
) -> PortalResult<Response> {
    guard(RouteGuard::User, host, req, next).await
}

/// Any signed-in caller, whatever the role
pub async fn require_session(
    State(host): State<Arc<ServerHost>>,
    mut req: Request,
    next: Next,
) -> PortalResult<Response> {
    let context = host.resolve_context(request_token(&req).as_deref()).await?;
    if !context.is_authenticated() {
        return Err(unauthorized());
    }
    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

async fn guard(
    route: RouteGuard,
    host: Arc<ServerHost>,
    mut req: Request,
    next: Next,
) -> PortalResult<Response> {
    let context = host.resolve_context(request_token(&req).as_deref()).await?;

    match route.check(&context) {
        GuardDecision::Allow => {
            req.extensions_mut().insert(context);
            Ok(next.run(req).await)
        }
        GuardDecision::Redirect { to } => {
            tracing::debug!(
                path = %req.uri().path(),
                guard = ?route,
                redirect = to,
                "Route guard redirect"
            );
            Err(rejection(&context, to))
        }
    }
}

fn unauthorized() -> PortalError {
    PortalError::Unauthorized {
        message: "Please sign in.".to_string(),
        redirect: LOGIN_PATH,
    }
}

/// Error for a caller the guard turned away
///
/// Callers without a usable session are unauthorized; callers whose role is
/// wrong for the route are forbidden. Both carry the redirect target.
fn rejection(context: &AuthContext, to: &'static str) -> PortalError {
    if to == LOGIN_PATH {
        PortalError::Unauthorized {
            message: if context.is_authenticated() {
                "Your account has no role assigned.".to_string()
            } else {
                "Please sign in.".to_string()
            },
            redirect: to,
        }
    } else {
        PortalError::Forbidden {
            message: "You do not have access to this page.".to_string(),
            redirect: to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::{ADMIN_PATH, DASHBOARD_PATH, Role};
    use crate::server::ServerBuilder;
    use axum::body::Body;
    use axum::http::{HeaderValue, StatusCode};
    use axum::routing::get;
    use axum::{Extension, Router, middleware};
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn whoami(Extension(context): Extension<AuthContext>) -> String {
        context.role().map(|role| role.as_str()).unwrap_or("none").to_string()
    }

    async fn admin_app() -> (Router, Arc<ServerHost>) {
        let host = Arc::new(ServerBuilder::new().in_memory().build_host().unwrap());
        let app = Router::new()
            .route("/api/whoami", get(whoami))
            .route_layer(middleware::from_fn_with_state(host.clone(), require_admin))
            .with_state(host.clone());
        (app, host)
    }

    async fn signed_in(host: &ServerHost, email: &str, role: Role) -> String {
        let session = host.identity.sign_up(email, "secret1", None).await.unwrap();
        host.write_profile(session.user_id, email, None, role).await.unwrap();
        session.token
    }

    fn get_with_token(uri: &str, token: &str) -> Request {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_request_token_from_query() {
        let req = Request::builder()
            .uri("/ws/exams?token=xyz")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_token(&req).as_deref(), Some("xyz"));

        let req = Request::builder().uri("/ws/exams").body(Body::empty()).unwrap();
        assert_eq!(request_token(&req), None);
    }

    #[test]
    fn test_rejection_kinds() {
        let anonymous = rejection(&AuthContext::Anonymous, LOGIN_PATH);
        assert_eq!(anonymous.error_code(), "UNAUTHORIZED");

        let user = AuthContext::Authenticated {
            user_id: Uuid::new_v4(),
            email: "u@example.com".to_string(),
            role: Some(Role::User),
        };
        let err = rejection(&user, DASHBOARD_PATH);
        assert_eq!(err.error_code(), "FORBIDDEN");

        let err = rejection(&user, ADMIN_PATH);
        assert_eq!(err.status_code(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_guard_attaches_context() {
        let (app, host) = admin_app().await;
        let token = signed_in(&host, "admin@example.com", Role::Admin).await;

        let response = app
            .oneshot(get_with_token("/api/whoami", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"admin");
    }

    #[tokio::test]
    async fn test_admin_guard_rejects() {
        let (app, host) = admin_app().await;
        let token = signed_in(&host, "user@example.com", Role::User).await;

        let anonymous = Request::builder()
            .uri("/api/whoami")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(anonymous).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(get_with_token("/api/whoami", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(get_with_token("/api/whoami", "stale-token"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
