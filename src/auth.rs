//! Persisted auth state and access-token refresh.
//!
//! One process-wide record. The token is refreshed when it expires within the
//! configured margin; a failed refresh clears the state and forces a fresh
//! sign-in instead of retrying. The refresh path runs under an async mutex so
//! concurrent callers cannot race duplicate refresh requests.

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::client::BackendApi;

/// Seconds before expiry at which a token is considered stale.
pub const DEFAULT_REFRESH_MARGIN_SECONDS: i64 = 60;

/// The persisted auth record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user_id: Option<String>,
    pub email: Option<String>,
    /// Unix timestamp (seconds) at which the access token expires
    pub expires_at: Option<i64>,
}

impl AuthState {
    /// True when the token is missing or expires within `margin` seconds.
    pub fn needs_refresh(&self, now: i64, margin: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - now <= margin,
            None => true,
        }
    }
}

/// Token bundle returned by the backend's auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Owns the auth record and its on-disk copy.
pub struct AuthManager {
    state_path: PathBuf,
    refresh_margin_seconds: i64,
    state: Mutex<AuthState>,
}

impl AuthManager {
    /// Load persisted auth state, or start signed out.
    pub async fn load(state_path: PathBuf, refresh_margin_seconds: i64) -> Result<Self> {
        let state = match fs::read_to_string(&state_path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(state) => state,
                Err(e) => {
                    warn!("Failed to parse auth state {}: {}", state_path.display(), e);
                    AuthState::default()
                }
            },
            Err(_) => AuthState::default(),
        };

        Ok(Self {
            state_path,
            refresh_margin_seconds,
            state: Mutex::new(state),
        })
    }

    /// Snapshot of the current auth record.
    pub async fn state(&self) -> AuthState {
        self.state.lock().await.clone()
    }

    /// Record a successful sign-in.
    pub async fn sign_in(&self, tokens: TokenResponse) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = Self::state_from_tokens(tokens);
        self.persist(&state).await?;
        info!("🔑 Signed in as {}", state.email.as_deref().unwrap_or("unknown"));
        Ok(())
    }

    /// Clear the auth record.
    pub async fn sign_out(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = AuthState::default();
        self.persist(&state).await?;
        Ok(())
    }

    /// Return a valid access token, refreshing it first when it expires
    /// within the margin. Returns `None` when signed out. On a failed
    /// refresh the state is cleared and an error is surfaced so the caller
    /// can prompt for re-sign-in.
    pub async fn ensure_fresh(&self, backend: &dyn BackendApi) -> Result<Option<String>> {
        // The lock is held across the refresh call: concurrent callers wait
        // instead of issuing duplicate refresh requests.
        let mut state = self.state.lock().await;

        if !state.is_authenticated {
            return Ok(None);
        }

        let now = Utc::now().timestamp();
        if !state.needs_refresh(now, self.refresh_margin_seconds) {
            return Ok(state.access_token.clone());
        }

        let refresh_token = match state.refresh_token.clone() {
            Some(token) => token,
            None => {
                *state = AuthState::default();
                self.persist(&state).await?;
                return Err(anyhow!("Session expired. Please sign in again."));
            }
        };

        match backend.refresh_tokens(&refresh_token).await {
            Ok(tokens) => {
                let mut refreshed = Self::state_from_tokens(tokens);
                // Keep profile fields the refresh response may omit.
                refreshed.user_id = refreshed.user_id.or_else(|| state.user_id.clone());
                refreshed.email = refreshed.email.or_else(|| state.email.clone());
                *state = refreshed;
                self.persist(&state).await?;
                info!("🔄 Access token refreshed");
                Ok(state.access_token.clone())
            }
            Err(e) => {
                warn!("Token refresh failed, clearing auth state: {}", e);
                *state = AuthState::default();
                self.persist(&state).await?;
                Err(anyhow!("Session expired. Please sign in again."))
            }
        }
    }

    fn state_from_tokens(tokens: TokenResponse) -> AuthState {
        AuthState {
            is_authenticated: true,
            expires_at: Some(Utc::now().timestamp() + tokens.expires_in),
            access_token: Some(tokens.access_token),
            refresh_token: Some(tokens.refresh_token),
            user_id: tokens.user_id,
            email: tokens.email,
        }
    }

    async fn persist(&self, state: &AuthState) -> Result<()> {
        if let Some(parent) = self.state_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(state)?;
        fs::write(&self.state_path, content).await?;
        Ok(())
    }
}
