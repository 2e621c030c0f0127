//! CLI command implementations.

mod auth;
mod employees;
mod tasks;

pub use auth::{login, logout, status};
pub use employees::{employee_add, employee_list, employee_remove};
pub use tasks::{stats, task_add, task_done, task_list, task_remove};

use anyhow::{bail, Result};
use crew_auth::{AuthPhase, AuthRuntime, AuthSnapshot, CredentialCache, SupabaseAuth};
use crew_core::{Config, Paths};
use crew_directory::{SupabaseEmployees, SupabaseRest, SupabaseTasks};
use std::sync::Arc;

/// Shared command context: config, auth runtime, and the Supabase stores.
pub struct AppContext {
    pub runtime: Arc<AuthRuntime>,
    pub rest: Arc<SupabaseRest>,
    pub employees: Arc<SupabaseEmployees>,
    pub tasks: SupabaseTasks,
}

impl AppContext {
    /// Build the context: load config, restore the session, wire the
    /// stores.
    pub async fn init() -> Result<Self> {
        let paths = Paths::new()?;
        let config = Config::load(&paths)?;

        let rest = Arc::new(SupabaseRest::new(
            config.supabase_url.clone(),
            config.supabase_anon_key.clone(),
        ));
        let provider = Arc::new(SupabaseAuth::new(
            config.supabase_url.clone(),
            config.supabase_anon_key.clone(),
            CredentialCache::new(&paths),
        ));
        let employees = Arc::new(SupabaseEmployees::new(rest.clone()));

        let runtime = AuthRuntime::start(provider, employees.clone()).await?;

        let context = Self {
            runtime,
            tasks: SupabaseTasks::new(rest.clone()),
            employees,
            rest,
        };
        context.sync_bearer();

        tracing::debug!(phase = ?context.runtime.snapshot().phase(), "Command context ready");
        Ok(context)
    }

    /// Keep the REST bearer token in step with the auth state.
    pub fn sync_bearer(&self) {
        self.rest
            .set_bearer(self.runtime.snapshot().session.map(|s| s.access_token));
    }

    /// The current snapshot, required to be signed in.
    pub fn require_signed_in(&self) -> Result<AuthSnapshot> {
        let snapshot = self.runtime.snapshot();
        match snapshot.phase() {
            AuthPhase::Initializing => bail!("Session state is still loading; try again"),
            AuthPhase::Unauthenticated => bail!("Not signed in. Run 'crew login' first"),
            _ => Ok(snapshot),
        }
    }

    /// The current snapshot, required to carry the admin role.
    pub fn require_admin(&self) -> Result<AuthSnapshot> {
        let snapshot = self.require_signed_in()?;
        if !snapshot.is_admin() {
            bail!("This command requires the admin role");
        }
        Ok(snapshot)
    }
}
