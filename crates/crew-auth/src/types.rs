//! Session and identity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated principal as issued by the identity provider.
///
/// The id is opaque; application-level data lives on the `Employee` record
/// joined by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An active authenticated session: identity plus provider-issued tokens
/// and their expiry horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub identity: Identity,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    /// Whether the access token's expiry horizon has passed.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// A provider-driven session change.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The startup restore result. May be observed both from the explicit
    /// restore call and as a replayed subscription event; handlers must be
    /// idempotent.
    InitialSession(Option<AuthSession>),
    SignedIn(AuthSession),
    TokenRefreshed(AuthSession),
    SignedOut,
}

impl SessionEvent {
    /// The session this event carries, if any.
    pub fn session(&self) -> Option<&AuthSession> {
        match self {
            SessionEvent::InitialSession(session) => session.as_ref(),
            SessionEvent::SignedIn(session) | SessionEvent::TokenRefreshed(session) => {
                Some(session)
            }
            SessionEvent::SignedOut => None,
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::InitialSession(_) => "initial_session",
            SessionEvent::SignedIn(_) => "signed_in",
            SessionEvent::TokenRefreshed(_) => "token_refreshed",
            SessionEvent::SignedOut => "signed_out",
        }
    }
}
