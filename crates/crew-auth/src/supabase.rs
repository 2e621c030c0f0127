//! Supabase (GoTrue) identity provider.
//!
//! Talks to the `/auth/v1/` endpoints for password sign-in, sign-out, and
//! token refresh. Sessions persist across process runs via the
//! `CredentialCache`; the internal FSM tracks the session lifecycle
//! explicitly.

use crate::credentials::CredentialCache;
use crate::provider::IdentityProvider;
use crate::session_fsm::{SessionMachine, SessionMachineInput, SessionState};
use crate::types::{AuthSession, Identity, SessionEvent};
use crate::{AuthError, AuthResult};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Buffered session events per subscriber.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Supabase token endpoint response (password and refresh grants share it).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl TokenResponse {
    fn into_session(self) -> AuthSession {
        AuthSession {
            identity: Identity {
                id: self.user.id,
                email: self.user.email,
            },
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: Utc::now() + Duration::seconds(self.expires_in),
        }
    }
}

/// Supabase-backed identity provider.
pub struct SupabaseAuth {
    http_client: reqwest::Client,
    supabase_url: String,
    anon_key: String,
    cache: CredentialCache,
    /// Internal FSM for tracking session lifecycle transitions.
    fsm: Mutex<SessionMachine>,
    events: broadcast::Sender<SessionEvent>,
}

impl SupabaseAuth {
    /// Create a new provider.
    pub fn new(
        supabase_url: impl Into<String>,
        anon_key: impl Into<String>,
        cache: CredentialCache,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            http_client: reqwest::Client::new(),
            supabase_url: supabase_url.into(),
            anon_key: anon_key.into(),
            cache,
            fsm: Mutex::new(SessionMachine::new()),
            events,
        }
    }

    /// Get the current FSM state.
    pub fn session_state(&self) -> SessionState {
        let fsm = self.fsm.lock().unwrap();
        SessionState::from(fsm.state())
    }

    /// Transition the FSM, logging state changes.
    fn transition(&self, input: &SessionMachineInput) -> AuthResult<SessionState> {
        let mut fsm = self.fsm.lock().unwrap();
        let old_state = SessionState::from(fsm.state());

        fsm.consume(input).map_err(|_| {
            AuthError::State(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                fsm.state()
            ))
        })?;

        let new_state = SessionState::from(fsm.state());
        if old_state != new_state {
            debug!(?old_state, ?new_state, "Session state transition");
        }

        Ok(new_state)
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn auth_url(&self, path_and_query: &str) -> String {
        format!("{}/auth/v1/{}", self.supabase_url, path_and_query)
    }

    /// Refresh a session with the refresh-token grant and persist the
    /// rotated tokens.
    async fn refresh(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        let url = self.auth_url("token?grant_type=refresh_token");

        debug!(url = %url, "Refreshing token");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Token refresh failed");
            return Err(AuthError::TokenRefresh(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let data: TokenResponse = response.json().await?;
        let session = data.into_session();
        self.cache.save(&session)?;

        info!(user_id = %session.identity.id, "Token refreshed");
        Ok(session)
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.transition(&SessionMachineInput::SignInRequested)?;

        let url = self.auth_url("token?grant_type=password");

        debug!(url = %url, email = %email, "Attempting password sign-in");

        let response = self
            .http_client
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                let _ = self.transition(&SessionMachineInput::SignInFailed);
                return Err(AuthError::Http(e));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Sign-in rejected");
            let _ = self.transition(&SessionMachineInput::SignInFailed);
            return Err(AuthError::InvalidCredentials(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let data: TokenResponse = match response.json().await {
            Ok(d) => d,
            Err(e) => {
                let _ = self.transition(&SessionMachineInput::SignInFailed);
                return Err(AuthError::Http(e));
            }
        };

        let session = data.into_session();
        self.cache.save(&session)?;

        self.transition(&SessionMachineInput::SignInSucceeded)?;
        self.emit(SessionEvent::SignedIn(session.clone()));

        info!(user_id = %session.identity.id, "Signed in");
        Ok(session)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        // Tolerate sign-out from any state; storage is cleared regardless.
        let _ = self.transition(&SessionMachineInput::SignOutRequested);

        let stored = self.cache.load()?;

        let result = match stored {
            Some(session) => {
                let url = self.auth_url("logout");
                match self
                    .http_client
                    .post(&url)
                    .header("apikey", &self.anon_key)
                    .header("Authorization", format!("Bearer {}", session.access_token))
                    .send()
                    .await
                {
                    Ok(response) if response.status().is_success() => Ok(()),
                    Ok(response) => {
                        let status = response.status();
                        let body = response.text().await.unwrap_or_default();
                        warn!(status = %status, body = %body, "Provider sign-out failed");
                        Err(AuthError::InvalidCredentials(format!(
                            "HTTP {}: {}",
                            status, body
                        )))
                    }
                    Err(e) => Err(AuthError::Http(e)),
                }
            }
            None => Ok(()),
        };

        // Local state clears whether or not the provider call succeeded
        self.cache.clear()?;
        let _ = self.transition(&SessionMachineInput::SignOutCompleted);
        self.emit(SessionEvent::SignedOut);

        info!("Signed out");
        result
    }

    async fn current_session(&self) -> AuthResult<Option<AuthSession>> {
        self.transition(&SessionMachineInput::RestoreRequested)?;

        let stored = match self.cache.load()? {
            Some(session) => session,
            None => {
                debug!("No persisted session found");
                let _ = self.transition(&SessionMachineInput::RestoredNone);
                return Ok(None);
            }
        };

        if !stored.is_expired() {
            let _ = self.transition(&SessionMachineInput::RestoredActive);
            info!(user_id = %stored.identity.id, "Session restored");
            return Ok(Some(stored));
        }

        info!(user_id = %stored.identity.id, "Persisted session expired, refreshing");
        let _ = self.transition(&SessionMachineInput::RestoredExpired);

        match self.refresh(&stored.refresh_token).await {
            Ok(session) => {
                let _ = self.transition(&SessionMachineInput::RefreshSucceeded);
                self.emit(SessionEvent::TokenRefreshed(session.clone()));
                Ok(Some(session))
            }
            Err(e) if e.is_transient() => {
                // The session may still be valid; let the caller retry
                let _ = self.transition(&SessionMachineInput::RefreshFailed);
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "Refresh failed, clearing persisted session");
                self.cache.clear()?;
                let _ = self.transition(&SessionMachineInput::RefreshFailed);
                Ok(None)
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
