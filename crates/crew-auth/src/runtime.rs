//! Process-wide authentication runtime.
//!
//! Composes the credential resolver, session store, and profile loader
//! into one shared context. Consumers read an `AuthSnapshot` (directly or
//! through a watch channel); every state change replaces the snapshot
//! atomically, so the session and profile are always observed together.

use crate::profile::ProfileLoader;
use crate::provider::IdentityProvider;
use crate::resolver::CredentialResolver;
use crate::store::SessionStore;
use crate::types::{AuthSession, Identity};
use crate::AuthResult;
use crew_directory::{Employee, EmployeeDirectory};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Externally visible authentication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Startup restore has not completed yet; gated content must not
    /// render.
    Initializing,
    /// No active session.
    Unauthenticated,
    /// Active session without a matching employee record (account pending
    /// setup, or the profile fetch is still in flight).
    AuthenticatedNoProfile,
    /// Active session with a loaded employee record.
    AuthenticatedWithProfile,
}

/// Snapshot of the authentication context.
///
/// `is_admin` and `phase` are derived on demand rather than stored, so
/// they can never go stale relative to the profile.
#[derive(Debug, Clone)]
pub struct AuthSnapshot {
    pub session: Option<AuthSession>,
    pub profile: Option<Employee>,
    pub loading: bool,
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self {
            session: None,
            profile: None,
            loading: true,
        }
    }
}

impl AuthSnapshot {
    /// The authenticated identity, if any.
    pub fn identity(&self) -> Option<&Identity> {
        self.session.as_ref().map(|s| &s.identity)
    }

    /// Whether the current profile carries the admin role.
    pub fn is_admin(&self) -> bool {
        self.profile
            .as_ref()
            .map(|p| p.role.is_admin())
            .unwrap_or(false)
    }

    /// The current phase, derived from the snapshot contents.
    pub fn phase(&self) -> AuthPhase {
        if self.loading {
            AuthPhase::Initializing
        } else if self.session.is_none() {
            AuthPhase::Unauthenticated
        } else if self.profile.is_none() {
            AuthPhase::AuthenticatedNoProfile
        } else {
            AuthPhase::AuthenticatedWithProfile
        }
    }
}

/// Shared authentication runtime.
///
/// Construct once at process start with [`AuthRuntime::start`]; inject
/// into consumers rather than reaching for globals. [`shutdown`] (or
/// dropping the last handle) cancels the event listener.
///
/// [`shutdown`]: AuthRuntime::shutdown
pub struct AuthRuntime {
    provider: Arc<dyn IdentityProvider>,
    resolver: CredentialResolver,
    profiles: ProfileLoader,
    store: Arc<SessionStore>,
    snapshot: watch::Sender<AuthSnapshot>,
    /// Monotonic token for profile fetches. A fetch result only lands if
    /// no newer session event arrived while it was in flight.
    profile_epoch: AtomicU64,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl AuthRuntime {
    /// Restore the session state and start processing session events.
    pub async fn start(
        provider: Arc<dyn IdentityProvider>,
        directory: Arc<dyn EmployeeDirectory>,
    ) -> AuthResult<Arc<Self>> {
        let store = SessionStore::start(provider.clone()).await?;
        let (snapshot, _) = watch::channel(AuthSnapshot::default());

        let runtime = Arc::new(Self {
            provider,
            resolver: CredentialResolver::new(directory.clone()),
            profiles: ProfileLoader::new(directory),
            store: store.clone(),
            snapshot,
            profile_epoch: AtomicU64::new(0),
            listener: Mutex::new(None),
        });

        let mut events = store.subscribe();

        // Seed from the restored session; from here on loading is false.
        runtime.clone().apply_session(store.current());

        let listener = tokio::spawn({
            let runtime = Arc::downgrade(&runtime);
            async move {
                loop {
                    match events.recv().await {
                        Ok(event) => {
                            let Some(runtime) = runtime.upgrade() else { break };
                            debug!(event = event.kind(), "Applying session event");
                            runtime.apply_session(event.session().cloned());
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            let Some(runtime) = runtime.upgrade() else { break };
                            warn!(skipped, "Session events lagged; resyncing from store");
                            let current = runtime.store.current();
                            runtime.apply_session(current);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });
        *runtime.listener.lock().unwrap() = Some(listener);

        info!(phase = ?runtime.snapshot().phase(), "Auth runtime started");
        Ok(runtime)
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> AuthSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Watch snapshot changes. Each observed value is one complete,
    /// consistent state.
    pub fn watch(&self) -> watch::Receiver<AuthSnapshot> {
        self.snapshot.subscribe()
    }

    /// Sign in with a display name or email plus password.
    ///
    /// The identifier resolves through the employee roster only when it is
    /// not already an email; resolution failures surface before any
    /// provider call. On success the snapshot reflects the new session and
    /// profile before this returns.
    pub async fn sign_in(&self, identifier: &str, password: &str) -> AuthResult<()> {
        let email = self.resolver.resolve(identifier).await?;
        let session = self
            .provider
            .sign_in_with_password(&email, password)
            .await?;

        let epoch = self.note_session(&session);
        let profile = self.fetch_profile(&session.identity).await;
        self.install_profile(epoch, profile);
        Ok(())
    }

    /// Sign out.
    ///
    /// Local session and profile state clears in one update regardless of
    /// whether the provider call succeeded; a provider error is still
    /// returned afterwards.
    pub async fn sign_out(&self) -> AuthResult<()> {
        let result = self.provider.sign_out().await;
        self.clear_session();
        result
    }

    /// Stop processing session events.
    pub fn shutdown(&self) {
        if let Some(listener) = self.listener.lock().unwrap().take() {
            listener.abort();
        }
        self.store.shutdown();
    }

    /// Apply a session value from the event stream.
    fn apply_session(self: Arc<Self>, session: Option<AuthSession>) {
        let Some(session) = session else {
            self.clear_session();
            return;
        };

        let (same_session, profile_loaded) = {
            let current = self.snapshot.borrow();
            let same = current
                .session
                .as_ref()
                .map(|c| c.access_token == session.access_token)
                .unwrap_or(false);
            (same, current.profile.is_some())
        };

        if same_session && profile_loaded {
            // Initial restore replayed through the subscription; the state
            // it describes is already in place.
            debug!("Ignoring redelivered session");
            return;
        }

        let epoch = self.note_session(&session);

        tokio::spawn(async move {
            let profile = self.fetch_profile(&session.identity).await;
            self.install_profile(epoch, profile);
        });
    }

    /// Record a new session in the snapshot and invalidate in-flight
    /// profile fetches. Returns the epoch for the follow-up fetch.
    fn note_session(&self, session: &AuthSession) -> u64 {
        let epoch = self.profile_epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let same_user = {
            let current = self.snapshot.borrow();
            current
                .session
                .as_ref()
                .map(|c| c.identity.id == session.identity.id)
                .unwrap_or(false)
        };

        self.snapshot.send_modify(|s| {
            // A different principal's profile must never survive into the
            // new session's state.
            if !same_user {
                s.profile = None;
            }
            s.session = Some(session.clone());
            s.loading = false;
        });

        epoch
    }

    /// Clear session and profile together, in a single update.
    fn clear_session(&self) {
        self.profile_epoch.fetch_add(1, Ordering::SeqCst);
        self.snapshot.send_modify(|s| {
            s.session = None;
            s.profile = None;
            s.loading = false;
        });
    }

    async fn fetch_profile(&self, identity: &Identity) -> Option<Employee> {
        match self.profiles.load(identity).await {
            Ok(profile) => profile,
            Err(error) => {
                // Not fatal: the account surfaces as pending setup.
                warn!(error = %error, user_id = %identity.id, "Profile fetch failed");
                None
            }
        }
    }

    /// Install a fetched profile unless a newer session event superseded
    /// the fetch.
    fn install_profile(&self, epoch: u64, profile: Option<Employee>) {
        let installed = self.snapshot.send_if_modified(|s| {
            if self.profile_epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            s.profile = profile;
            true
        });

        if !installed {
            debug!("Dropped stale profile fetch result");
        }
    }
}

impl Drop for AuthRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use crew_directory::Role;
    use uuid::Uuid;

    fn snapshot(session: bool, profile: Option<Role>, loading: bool) -> AuthSnapshot {
        AuthSnapshot {
            session: session.then(|| AuthSession {
                identity: Identity {
                    id: "user-1".to_string(),
                    email: Some("jane@co.com".to_string()),
                },
                access_token: "access".to_string(),
                refresh_token: "refresh".to_string(),
                expires_at: Utc::now() + Duration::hours(1),
            }),
            profile: profile.map(|role| Employee {
                id: Uuid::new_v4(),
                name: "Jane Doe".to_string(),
                email: "jane@co.com".to_string(),
                role,
                department: "Engineering".to_string(),
                position: "Lead".to_string(),
                created_at: None,
                updated_at: None,
            }),
            loading,
        }
    }

    #[test]
    fn phase_initializing_while_loading() {
        assert_eq!(snapshot(false, None, true).phase(), AuthPhase::Initializing);
    }

    #[test]
    fn phase_unauthenticated_without_session() {
        assert_eq!(
            snapshot(false, None, false).phase(),
            AuthPhase::Unauthenticated
        );
    }

    #[test]
    fn phase_no_profile_with_bare_session() {
        assert_eq!(
            snapshot(true, None, false).phase(),
            AuthPhase::AuthenticatedNoProfile
        );
    }

    #[test]
    fn phase_with_profile() {
        assert_eq!(
            snapshot(true, Some(Role::User), false).phase(),
            AuthPhase::AuthenticatedWithProfile
        );
    }

    #[test]
    fn is_admin_follows_profile_role() {
        assert!(snapshot(true, Some(Role::Admin), false).is_admin());
        assert!(!snapshot(true, Some(Role::User), false).is_admin());
        assert!(!snapshot(true, None, false).is_admin());
    }

    #[test]
    fn default_snapshot_is_initializing() {
        let snap = AuthSnapshot::default();
        assert!(snap.loading);
        assert_eq!(snap.phase(), AuthPhase::Initializing);
    }
}
