//! Signed-in viewer state.
//!
//! [`AuthSession`] is created once at startup by hydrating from the state
//! file, updated by `login`/`refresh`, and torn down by `logout`. It owns the
//! [`BearerToken`] slot the HTTP client reads from.

use crate::api::{AuthApi, BearerToken, Credentials};
use crate::error::{ApiError, Result};
use crate::models::{Role, UserProfile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// What gets written to disk between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: UserProfile,
}

/// JSON file holding the persisted session
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session. A file that no longer parses is removed and
    /// treated as logged out.
    pub async fn load(&self) -> Result<Option<StoredSession>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(err) => {
                warn!("Discarding unreadable session file {}: {}", self.path.display(), err);
                self.clear().await?;
                Ok(None)
            }
        }
    }

    pub async fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(session)?;
        tokio::fs::write(&self.path, json).await?;
        debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

pub struct AuthSession {
    store: SessionStore,
    token: BearerToken,
    current: Option<StoredSession>,
}

impl AuthSession {
    /// Restore the persisted session (if any) and publish its token
    pub async fn hydrate(store: SessionStore, token: BearerToken) -> Result<Self> {
        let current = store.load().await?;
        match &current {
            Some(session) => {
                token.set(session.access_token.clone());
                info!(username = %session.user.username, "Restored session");
            }
            None => token.clear(),
        }

        Ok(Self {
            store,
            token,
            current,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.current.as_ref().map(|s| &s.user)
    }

    pub fn role(&self) -> Option<Role> {
        self.user().map(|u| u.role)
    }

    pub fn token(&self) -> &BearerToken {
        &self.token
    }

    pub async fn login<A: AuthApi + ?Sized>(
        &mut self,
        api: &A,
        username: &str,
        password: &str,
    ) -> Result<&UserProfile> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ApiError::Validation(
                "username and password are required".to_string(),
            ));
        }

        let response = api
            .login(&Credentials {
                username: username.trim().to_string(),
                password: password.to_string(),
            })
            .await?;

        let session = StoredSession {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            user: response.user,
        };
        self.store.save(&session).await?;
        self.token.set(session.access_token.clone());

        Ok(&self.current.insert(session).user)
    }

    /// Swap the access token for a fresh one using the stored refresh token
    pub async fn refresh<A: AuthApi + ?Sized>(&mut self, api: &A) -> Result<()> {
        let refresh_token = self
            .current
            .as_ref()
            .and_then(|s| s.refresh_token.clone())
            .ok_or(ApiError::AuthenticationRequired)?;

        let access_token = api.refresh(&refresh_token).await?;

        if let Some(session) = self.current.as_mut() {
            session.access_token = access_token.clone();
            self.store.save(session).await?;
        }
        self.token.set(access_token);
        info!("Refreshed access token");
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.current = None;
        self.token.clear();
        self.store.clear().await?;
        info!("Logged out");
        Ok(())
    }
}
