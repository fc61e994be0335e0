//! In-process identity provider.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use notekeep_core::{Error, IdentityProvider, Result, User};

/// Holds at most one session in memory.
///
/// Sign-in itself happens outside notekeep; whatever performs it calls
/// [`sign_in`](Self::sign_in) with the authenticated username.
#[derive(Default)]
pub struct SessionIdentityProvider {
    session: RwLock<Option<User>>,
}

impl SessionIdentityProvider {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(username: impl Into<String>) -> Self {
        Self {
            session: RwLock::new(Some(User::new(username))),
        }
    }

    /// Start a session for `username`, replacing any existing one.
    pub async fn sign_in(&self, username: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::InvalidInput("username must not be empty".to_string()));
        }
        let user = User::new(username);
        *self.session.write().await = Some(user.clone());
        info!(subsystem = "identity", op = "sign_in", username = %user.username, "Signed in");
        Ok(user)
    }
}

#[async_trait]
impl IdentityProvider for SessionIdentityProvider {
    async fn current_user(&self) -> Result<Option<User>> {
        Ok(self.session.read().await.clone())
    }

    async fn sign_out(&self) -> Result<()> {
        if let Some(user) = self.session.write().await.take() {
            info!(subsystem = "identity", op = "sign_out", username = %user.username, "Signed out");
        }
        Ok(())
    }
}
