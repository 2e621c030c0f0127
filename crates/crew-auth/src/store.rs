//! Session store: current session plus change notifications.

use crate::provider::IdentityProvider;
use crate::types::{AuthSession, SessionEvent};
use crate::AuthResult;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Buffered session events per subscriber.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Holds the current session and relays provider session-change events.
///
/// On startup the store subscribes to the provider *before* asking it for
/// the restored session, so no event emitted during the restore can be
/// missed. The cost is that the initial state may be delivered twice (once
/// from the restore call, once replayed through the subscription);
/// downstream consumers must treat the redelivery as a no-op.
pub struct SessionStore {
    current: watch::Sender<Option<AuthSession>>,
    events: broadcast::Sender<SessionEvent>,
    forward_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    /// Restore the initial session and begin relaying provider events.
    pub async fn start(provider: Arc<dyn IdentityProvider>) -> AuthResult<Arc<Self>> {
        // Subscribe first; events emitted while the restore call is in
        // flight would otherwise be lost.
        let mut provider_events = provider.subscribe();
        let restored = provider.current_session().await?;

        debug!(restored = restored.is_some(), "Session store starting");

        let (current, _) = watch::channel(restored);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let store = Arc::new(Self {
            current,
            events,
            forward_task: Mutex::new(None),
        });

        let task = tokio::spawn({
            let store = Arc::downgrade(&store);
            async move {
                loop {
                    match provider_events.recv().await {
                        Ok(event) => {
                            let Some(store) = store.upgrade() else { break };
                            store.publish(event);
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Session event stream lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });
        *store.forward_task.lock().unwrap() = Some(task);

        Ok(store)
    }

    /// Record an event and relay it to subscribers.
    fn publish(&self, event: SessionEvent) {
        debug!(event = event.kind(), "Session change");
        // The watch value updates before the event fans out so `current`
        // is never behind an already-delivered event.
        self.current.send_replace(event.session().cloned());
        let _ = self.events.send(event);
    }

    /// The current session, if any.
    pub fn current(&self) -> Option<AuthSession> {
        self.current.borrow().clone()
    }

    /// Watch the current session value.
    pub fn watch(&self) -> watch::Receiver<Option<AuthSession>> {
        self.current.subscribe()
    }

    /// Subscribe to relayed session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Stop relaying provider events.
    pub fn shutdown(&self) {
        if let Some(task) = self.forward_task.lock().unwrap().take() {
            task.abort();
        }
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Identity;
    use crate::AuthError;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    /// Provider stub with a scripted restore result and injectable events.
    struct StubProvider {
        restored: Option<AuthSession>,
        /// When set, the restore call also replays the initial session
        /// through the subscription (the double-delivery case).
        replay_initial: bool,
        events: broadcast::Sender<SessionEvent>,
    }

    impl StubProvider {
        fn new(restored: Option<AuthSession>, replay_initial: bool) -> Arc<Self> {
            let (events, _) = broadcast::channel(16);
            Arc::new(Self {
                restored,
                replay_initial,
                events,
            })
        }

        fn emit(&self, event: SessionEvent) {
            let _ = self.events.send(event);
        }
    }

    #[async_trait]
    impl IdentityProvider for StubProvider {
        async fn sign_in_with_password(
            &self,
            _email: &str,
            _password: &str,
        ) -> AuthResult<AuthSession> {
            Err(AuthError::NotSignedIn)
        }

        async fn sign_out(&self) -> AuthResult<()> {
            self.emit(SessionEvent::SignedOut);
            Ok(())
        }

        async fn current_session(&self) -> AuthResult<Option<AuthSession>> {
            if self.replay_initial {
                self.emit(SessionEvent::InitialSession(self.restored.clone()));
            }
            Ok(self.restored.clone())
        }

        fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
            self.events.subscribe()
        }
    }

    fn session(id: &str) -> AuthSession {
        AuthSession {
            identity: Identity {
                id: id.to_string(),
                email: Some(format!("{}@co.com", id)),
            },
            access_token: format!("token-{}", id),
            refresh_token: format!("refresh-{}", id),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn start_seeds_current_from_restore() {
        let provider = StubProvider::new(Some(session("user-1")), false);
        let store = SessionStore::start(provider).await.unwrap();

        let current = store.current().unwrap();
        assert_eq!(current.identity.id, "user-1");
    }

    #[tokio::test]
    async fn start_without_persisted_session() {
        let provider = StubProvider::new(None, false);
        let store = SessionStore::start(provider).await.unwrap();
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn replayed_initial_session_is_delivered_and_consistent() {
        let provider = StubProvider::new(Some(session("user-1")), true);
        let store = SessionStore::start(provider.clone()).await.unwrap();

        let mut events = store.subscribe();

        // The replayed initial event was emitted before the store's own
        // subscribers existed; the forwarding task relays it now.
        let event = tokio::time::timeout(std::time::Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(event, SessionEvent::InitialSession(Some(_))));

        // Redelivery left the current value unchanged.
        assert_eq!(store.current().unwrap().identity.id, "user-1");
    }

    #[tokio::test]
    async fn forwarded_events_update_current() {
        let provider = StubProvider::new(None, false);
        let store = SessionStore::start(provider.clone()).await.unwrap();

        let mut watcher = store.watch();
        provider.emit(SessionEvent::SignedIn(session("user-2")));

        tokio::time::timeout(std::time::Duration::from_secs(1), watcher.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(store.current().unwrap().identity.id, "user-2");

        provider.emit(SessionEvent::SignedOut);
        tokio::time::timeout(std::time::Duration::from_secs(1), watcher.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn shutdown_stops_forwarding() {
        let provider = StubProvider::new(None, false);
        let store = SessionStore::start(provider.clone()).await.unwrap();

        store.shutdown();
        // Give the aborted task a chance to wind down.
        tokio::task::yield_now().await;

        provider.emit(SessionEvent::SignedIn(session("user-3")));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        assert!(store.current().is_none());
    }
}
