//! Credential resolution: name-or-email → email.

use crate::{AuthError, AuthResult};
use crew_directory::EmployeeDirectory;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves a user-supplied identifier to the email address used for
/// password authentication.
pub struct CredentialResolver {
    directory: Arc<dyn EmployeeDirectory>,
}

impl CredentialResolver {
    pub fn new(directory: Arc<dyn EmployeeDirectory>) -> Self {
        Self { directory }
    }

    /// Resolve an identifier to an email.
    ///
    /// Identifiers containing `@` are already emails and pass through
    /// without a lookup. Anything else is treated as a display name and
    /// matched exactly (case-sensitive) against the employee roster.
    /// Zero matches fail; so does more than one — an ambiguous name is a
    /// data-integrity fault and never resolves to an arbitrary record.
    pub async fn resolve(&self, identifier: &str) -> AuthResult<String> {
        if identifier.contains('@') {
            return Ok(identifier.to_string());
        }

        debug!(name = %identifier, "Looking up email by display name");

        let matches = self.directory.find_by_name(identifier).await?;
        if matches.len() > 1 {
            warn!(name = %identifier, count = matches.len(), "Ambiguous display name");
            return Err(AuthError::EmployeeNotFound(identifier.to_string()));
        }

        match matches.into_iter().next() {
            Some(employee) => {
                debug!(name = %identifier, email = %employee.email, "Resolved display name");
                Ok(employee.email)
            }
            None => Err(AuthError::EmployeeNotFound(identifier.to_string())),
        }
    }
}
