//! Test harness for the auth runtime integration tests.
//!
//! Provides:
//! - MockProvider: scripted identity provider that records sign-in calls
//!   and supports injecting session events
//! - TestDirectory: an employee roster with call counters, per-email
//!   latency, and raw seeding (including duplicate names)

use async_trait::async_trait;
use chrono::{Duration, Utc};
use crew_auth::{AuthError, AuthResult, AuthSession, Identity, IdentityProvider, SessionEvent};
use crew_directory::{
    DataResult, Employee, EmployeeDirectory, EmployeeUpdate, NewEmployee, Role,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Build a session for a given email. The access token is derived from the
/// email so redelivered sessions compare equal.
pub fn session_for(email: &str) -> AuthSession {
    AuthSession {
        identity: Identity {
            id: format!("id-{}", email),
            email: Some(email.to_string()),
        },
        access_token: format!("token-{}", email),
        refresh_token: format!("refresh-{}", email),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

/// A session with the same identity but a rotated access token, as issued
/// by a token refresh.
pub fn rotated(session: &AuthSession) -> AuthSession {
    let mut rotated = session.clone();
    rotated.access_token = format!("{}-rotated", session.access_token);
    rotated
}

/// Scripted identity provider.
pub struct MockProvider {
    /// email -> password
    accounts: Mutex<HashMap<String, String>>,
    sign_in_calls: Mutex<Vec<String>>,
    restored: Mutex<Option<AuthSession>>,
    /// When set, `current_session` also replays the initial session
    /// through the subscription (the double-delivery case).
    replay_initial: AtomicBool,
    events: broadcast::Sender<SessionEvent>,
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            accounts: Mutex::new(HashMap::new()),
            sign_in_calls: Mutex::new(Vec::new()),
            restored: Mutex::new(None),
            replay_initial: AtomicBool::new(false),
            events,
        })
    }

    /// Register an account the provider will accept.
    pub fn add_account(&self, email: &str, password: &str) {
        self.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), password.to_string());
    }

    /// Script the startup restore result.
    pub fn set_restored(&self, session: Option<AuthSession>) {
        *self.restored.lock().unwrap() = session;
    }

    pub fn set_replay_initial(&self, replay: bool) {
        self.replay_initial.store(replay, Ordering::SeqCst);
    }

    /// Inject a session event, as the provider would on external changes.
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    /// Emails passed to `sign_in_with_password`, in order.
    pub fn sign_in_calls(&self) -> Vec<String> {
        self.sign_in_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.sign_in_calls.lock().unwrap().push(email.to_string());

        let accepted = self
            .accounts
            .lock()
            .unwrap()
            .get(email)
            .map(|expected| expected == password)
            .unwrap_or(false);

        if !accepted {
            return Err(AuthError::InvalidCredentials(
                "HTTP 400: invalid_grant".to_string(),
            ));
        }

        let session = session_for(email);
        self.emit(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        self.emit(SessionEvent::SignedOut);
        Ok(())
    }

    async fn current_session(&self) -> AuthResult<Option<AuthSession>> {
        let restored = self.restored.lock().unwrap().clone();
        if self.replay_initial.load(Ordering::SeqCst) {
            self.emit(SessionEvent::InitialSession(restored.clone()));
        }
        Ok(restored)
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

/// Employee roster with instrumentation for the tests.
#[derive(Default)]
pub struct TestDirectory {
    employees: Mutex<Vec<Employee>>,
    name_lookups: AtomicUsize,
    email_lookups: AtomicUsize,
    /// Artificial latency for `find_by_email`, per email.
    delays: Mutex<HashMap<String, std::time::Duration>>,
}

impl TestDirectory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed an employee record directly (duplicates allowed).
    pub fn seed(&self, name: &str, email: &str, role: Role) -> Employee {
        let employee = Employee {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            department: "Engineering".to_string(),
            position: "Developer".to_string(),
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        self.employees.lock().unwrap().push(employee.clone());
        employee
    }

    /// Replace the role on an existing record.
    pub fn set_role(&self, email: &str, role: Role) {
        let mut employees = self.employees.lock().unwrap();
        if let Some(employee) = employees.iter_mut().find(|e| e.email == email) {
            employee.role = role;
        }
    }

    /// Delay `find_by_email` responses for the given email.
    pub fn set_delay(&self, email: &str, delay: std::time::Duration) {
        self.delays
            .lock()
            .unwrap()
            .insert(email.to_string(), delay);
    }

    pub fn name_lookup_count(&self) -> usize {
        self.name_lookups.load(Ordering::SeqCst)
    }

    pub fn email_lookup_count(&self) -> usize {
        self.email_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmployeeDirectory for TestDirectory {
    async fn list(&self) -> DataResult<Vec<Employee>> {
        Ok(self.employees.lock().unwrap().clone())
    }

    async fn find_by_name(&self, name: &str) -> DataResult<Vec<Employee>> {
        self.name_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .employees
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.name == name)
            .cloned()
            .collect())
    }

    async fn find_by_email(&self, email: &str) -> DataResult<Option<Employee>> {
        self.email_lookups.fetch_add(1, Ordering::SeqCst);

        let delay = self.delays.lock().unwrap().get(email).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(self
            .employees
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.email == email)
            .cloned())
    }

    async fn create(&self, new: NewEmployee) -> DataResult<Employee> {
        Ok(self.seed(&new.name, &new.email, new.role))
    }

    async fn update(&self, _id: Uuid, _update: EmployeeUpdate) -> DataResult<Employee> {
        unimplemented!("not exercised by these tests")
    }

    async fn delete(&self, _id: Uuid) -> DataResult<()> {
        unimplemented!("not exercised by these tests")
    }
}
