//! Identity provider abstraction.

use crate::types::{AuthSession, SessionEvent};
use crate::AuthResult;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Trait for identity providers.
///
/// Implementations own the credential exchange and emit a `SessionEvent`
/// for every session change (sign-in, sign-out, token refresh). The
/// subscription is established by callers *before* `current_session` so no
/// event can be missed during startup; as a consequence the initial state
/// may be observed twice and consumers must treat redelivery as a no-op.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authenticate with email and password.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<AuthSession>;

    /// End the current session. Local state is cleared even when the
    /// provider call fails.
    async fn sign_out(&self) -> AuthResult<()>;

    /// The restored session, if a persisted one is still valid (refreshing
    /// it first when expired).
    async fn current_session(&self) -> AuthResult<Option<AuthSession>>;

    /// Subscribe to session change events.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}
