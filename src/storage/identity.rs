//! In-memory implementation of IdentityProvider for testing and development
//!
//! Credentials are kept in process memory only. This provider exists so the
//! portal can run and be tested without an external identity service.

use crate::core::auth::{AuthError, IdentityProvider, MIN_PASSWORD_LEN, Session};
use crate::core::field::FieldFormat;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Account {
    user_id: Uuid,
    email: String,
    password: String,
    display_name: Option<String>,
}

/// In-memory identity provider, for development and tests only
///
/// Passwords are stored and compared as plain text, and sessions never
/// expire until signed out. A deployment plugs a real identity service in
/// through [`IdentityProvider`] instead.
#[derive(Clone, Default)]
pub struct InMemoryIdentityProvider {
    /// Accounts keyed by lowercased email
    accounts: Arc<RwLock<HashMap<String, Account>>>,
    /// Open sessions keyed by token
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn open_session(&self, account: &Account) -> Result<Session> {
        let session = Session {
            token: Uuid::new_v4().simple().to_string(),
            user_id: account.user_id,
            email: account.email.clone(),
            display_name: account.display_name.clone(),
        };

        self.sessions
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?
            .insert(session.token.clone(), session.clone());
        Ok(session)
    }

    /// Number of open sessions
    pub fn session_count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Session> {
        let email = email.trim();
        if !FieldFormat::Email.is_valid(email) {
            return Err(AuthError::InvalidEmail.into());
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword.into());
        }

        let account = {
            let mut accounts = self
                .accounts
                .write()
                .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;
            let key = email.to_lowercase();
            if accounts.contains_key(&key) {
                return Err(AuthError::EmailInUse.into());
            }

            let account = Account {
                user_id: Uuid::new_v4(),
                email: email.to_string(),
                password: password.to_string(),
                display_name: display_name.map(str::to_string),
            };
            accounts.insert(key, account.clone());
            account
        };

        tracing::info!(user_id = %account.user_id, "Account created");
        self.open_session(&account)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let account = {
            let accounts = self
                .accounts
                .read()
                .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
            accounts
                .get(&email.trim().to_lowercase())
                .filter(|account| account.password == password)
                .cloned()
        };

        match account {
            Some(account) => {
                tracing::debug!(user_id = %account.user_id, "Signed in");
                self.open_session(&account)
            }
            None => Err(AuthError::InvalidCredentials.into()),
        }
    }

    async fn sign_out(&self, token: &str) -> Result<()> {
        let removed = self
            .sessions
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?
            .remove(token);

        if let Some(session) = removed {
            tracing::debug!(user_id = %session.user_id, "Signed out");
        }
        Ok(())
    }

    async fn session(&self, token: &str) -> Result<Option<Session>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;
        Ok(sessions.get(token).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_error(err: anyhow::Error) -> AuthError {
        err.downcast::<AuthError>().expect("an AuthError")
    }

    #[tokio::test]
    async fn test_sign_up_and_session() {
        let provider = InMemoryIdentityProvider::new();
        let session = provider
            .sign_up("new@example.com", "secret1", Some("New User"))
            .await
            .unwrap();

        assert_eq!(session.email, "new@example.com");
        let found = provider.session(&session.token).await.unwrap().unwrap();
        assert_eq!(found.user_id, session.user_id);
        assert_eq!(found.display_name.as_deref(), Some("New User"));
    }

    #[tokio::test]
    async fn test_sign_up_rejections() {
        let provider = InMemoryIdentityProvider::new();
        provider.sign_up("a@example.com", "secret1", None).await.unwrap();

        let err = provider.sign_up("A@example.com", "secret1", None).await.unwrap_err();
        assert_eq!(auth_error(err), AuthError::EmailInUse);

        let err = provider.sign_up("b@example.com", "123", None).await.unwrap_err();
        assert_eq!(auth_error(err), AuthError::WeakPassword);

        let err = provider.sign_up("not-an-email", "secret1", None).await.unwrap_err();
        assert_eq!(auth_error(err), AuthError::InvalidEmail);
    }

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let provider = InMemoryIdentityProvider::new();
        let created = provider.sign_up("a@example.com", "secret1", None).await.unwrap();

        let err = provider.sign_in("a@example.com", "wrong!").await.unwrap_err();
        assert_eq!(auth_error(err), AuthError::InvalidCredentials);

        let session = provider.sign_in(" A@Example.com ", "secret1").await.unwrap();
        assert_eq!(session.user_id, created.user_id);
        assert_ne!(session.token, created.token);
        assert_eq!(provider.session_count(), 2);

        provider.sign_out(&session.token).await.unwrap();
        assert!(provider.session(&session.token).await.unwrap().is_none());
        provider.sign_out("unknown").await.unwrap();
    }
}
