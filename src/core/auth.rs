//! Authentication context and route guards
//!
//! Every request carries an explicit [`AuthContext`] resolved from its bearer
//! token. Guards are pure decisions over that context:
//! - Admin routes: anonymous users go to `/login`, non-admins to `/dashboard`
//! - User routes: anonymous users go to `/login`, admins to `/`
//!
//! A missing or unknown role never grants access.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Login page path
pub const LOGIN_PATH: &str = "/login";

/// User dashboard path
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Admin console path
pub const ADMIN_PATH: &str = "/";

/// Role stored on a user profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Parse a stored role, `None` for anything unknown
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// A signed-in session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token identifying the session
    pub token: String,
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

/// Authorization context extracted from a request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthContext {
    /// No valid session
    #[default]
    Anonymous,

    /// Signed-in user, with the role read from their profile
    Authenticated {
        user_id: Uuid,
        email: String,
        role: Option<Role>,
    },
}

impl AuthContext {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthContext::Authenticated { .. })
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AuthContext::Authenticated { user_id, .. } => Some(*user_id),
            AuthContext::Anonymous => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            AuthContext::Authenticated { role, .. } => *role,
            AuthContext::Anonymous => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }
}

/// Outcome of a guard check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    Allow,
    Redirect { to: &'static str },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

/// Route classes protected by a guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGuard {
    /// Admin console routes
    Admin,
    /// User dashboard routes
    User,
}

impl RouteGuard {
    /// Decide whether the context may enter routes of this class
    pub fn check(&self, context: &AuthContext) -> GuardDecision {
        if !context.is_authenticated() {
            return GuardDecision::Redirect { to: LOGIN_PATH };
        }

        match (self, context.role()) {
            (RouteGuard::Admin, Some(Role::Admin)) => GuardDecision::Allow,
            (RouteGuard::Admin, _) => GuardDecision::Redirect { to: DASHBOARD_PATH },
            (RouteGuard::User, Some(Role::User)) => GuardDecision::Allow,
            (RouteGuard::User, Some(Role::Admin)) => GuardDecision::Redirect { to: ADMIN_PATH },
            (RouteGuard::User, None) => GuardDecision::Redirect { to: LOGIN_PATH },
        }
    }
}

/// Where a user lands after signing in
pub fn landing_path(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::User) => DASHBOARD_PATH,
        Some(Role::Admin) => ADMIN_PATH,
        None => LOGIN_PATH,
    }
}

/// Minimum password length accepted at sign-up
pub const MIN_PASSWORD_LEN: usize = 6;

/// Identity provider failures that are the caller's fault
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Email is already in use")]
    EmailInUse,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Password must be at least 6 characters")]
    WeakPassword,

    #[error("Invalid email address")]
    InvalidEmail,
}

/// Account management and session lookup
///
/// Errors that are an [`AuthError`] are reported to the client as such;
/// anything else is an internal failure.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and sign it in
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Session>;

    /// Open a session for existing credentials
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Close a session; unknown tokens are ignored
    async fn sign_out(&self, token: &str) -> Result<()>;

    /// Look up the session behind a bearer token
    async fn session(&self, token: &str) -> Result<Option<Session>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in(role: Option<Role>) -> AuthContext {
        AuthContext::Authenticated {
            user_id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse(" user "), Some(Role::User));
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_admin_guard() {
        let guard = RouteGuard::Admin;
        assert_eq!(
            guard.check(&AuthContext::Anonymous),
            GuardDecision::Redirect { to: "/login" }
        );
        assert_eq!(guard.check(&signed_in(Some(Role::Admin))), GuardDecision::Allow);
        assert_eq!(
            guard.check(&signed_in(Some(Role::User))),
            GuardDecision::Redirect { to: "/dashboard" }
        );
        assert_eq!(
            guard.check(&signed_in(None)),
            GuardDecision::Redirect { to: "/dashboard" }
        );
    }

    #[test]
    fn test_user_guard() {
        let guard = RouteGuard::User;
        assert_eq!(
            guard.check(&AuthContext::Anonymous),
            GuardDecision::Redirect { to: "/login" }
        );
        assert_eq!(guard.check(&signed_in(Some(Role::User))), GuardDecision::Allow);
        assert_eq!(
            guard.check(&signed_in(Some(Role::Admin))),
            GuardDecision::Redirect { to: "/" }
        );
        assert_eq!(
            guard.check(&signed_in(None)),
            GuardDecision::Redirect { to: "/login" }
        );
    }

    #[test]
    fn test_landing_path() {
        assert_eq!(landing_path(Some(Role::User)), "/dashboard");
        assert_eq!(landing_path(Some(Role::Admin)), "/");
        assert_eq!(landing_path(None), "/login");
    }

    #[test]
    fn test_context_accessors() {
        assert!(!AuthContext::Anonymous.is_authenticated());
        assert!(AuthContext::Anonymous.user_id().is_none());

        let admin = signed_in(Some(Role::Admin));
        assert!(admin.is_authenticated());
        assert!(admin.is_admin());
        assert!(!signed_in(None).is_admin());
    }
}
