//! Profile loading for authenticated identities.

use crate::types::Identity;
use crate::AuthResult;
use crew_directory::{Employee, EmployeeDirectory};
use std::sync::Arc;
use tracing::debug;

/// Fetches the employee record for an authenticated identity.
///
/// The join key is the identity's email. A missing record is `Ok(None)` —
/// the caller decides whether that matters; only transport and provider
/// errors propagate.
pub struct ProfileLoader {
    directory: Arc<dyn EmployeeDirectory>,
}

impl ProfileLoader {
    pub fn new(directory: Arc<dyn EmployeeDirectory>) -> Self {
        Self { directory }
    }

    /// Load the profile for an identity, if one exists.
    pub async fn load(&self, identity: &Identity) -> AuthResult<Option<Employee>> {
        let Some(email) = identity.email.as_deref() else {
            debug!(user_id = %identity.id, "Identity has no email; no profile to load");
            return Ok(None);
        };

        let profile = self.directory.find_by_email(email).await?;
        if profile.is_none() {
            debug!(user_id = %identity.id, email = %email, "No employee record for identity");
        }
        Ok(profile)
    }
}
