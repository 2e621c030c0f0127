//! Employee roster model and stores.
//!
//! The `employees` table is the canonical profile store: authentication
//! identities are joined to employee records by email, and the `role`
//! column drives admin gating.

use crate::client::{encode_component, SupabaseRest};
use crate::error::{DataError, DataResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Application role. Gates which operations are available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// An employee record (the application-level user profile).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    pub department: String,
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields for creating an employee.
#[derive(Debug, Clone, Serialize)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub department: String,
    pub position: String,
}

/// Partial update for an employee record.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmployeeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
}

/// Store trait for the employee roster.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// All employees, newest first.
    async fn list(&self) -> DataResult<Vec<Employee>>;

    /// All employees whose name exactly equals `name` (case-sensitive).
    /// Returns every match so callers can detect ambiguity.
    async fn find_by_name(&self, name: &str) -> DataResult<Vec<Employee>>;

    /// The employee with the given email, if any.
    async fn find_by_email(&self, email: &str) -> DataResult<Option<Employee>>;

    /// Create an employee. Fails with `Conflict` if the name is taken.
    async fn create(&self, new: NewEmployee) -> DataResult<Employee>;

    /// Patch mutable fields and bump `updated_at`.
    async fn update(&self, id: Uuid, update: EmployeeUpdate) -> DataResult<Employee>;

    /// Remove an employee record.
    async fn delete(&self, id: Uuid) -> DataResult<()>;
}

/// Supabase-backed employee store.
pub struct SupabaseEmployees {
    rest: Arc<SupabaseRest>,
}

const TABLE: &str = "employees";

impl SupabaseEmployees {
    pub fn new(rest: Arc<SupabaseRest>) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl EmployeeDirectory for SupabaseEmployees {
    async fn list(&self) -> DataResult<Vec<Employee>> {
        self.rest
            .select(TABLE, "select=*&order=created_at.desc")
            .await
    }

    async fn find_by_name(&self, name: &str) -> DataResult<Vec<Employee>> {
        let query = format!("name=eq.{}&select=*", encode_component(name));
        self.rest.select(TABLE, &query).await
    }

    async fn find_by_email(&self, email: &str) -> DataResult<Option<Employee>> {
        let query = format!("email=eq.{}&select=*&limit=1", encode_component(email));
        let rows: Vec<Employee> = self.rest.select(TABLE, &query).await?;
        Ok(rows.into_iter().next())
    }

    async fn create(&self, new: NewEmployee) -> DataResult<Employee> {
        // Sign-in by display name requires unique names.
        let existing = self.find_by_name(&new.name).await?;
        if !existing.is_empty() {
            return Err(DataError::Conflict(format!(
                "an employee named {} already exists",
                new.name
            )));
        }

        let created = self.rest.insert(TABLE, &new).await?;
        tracing::info!(name = %new.name, "Employee created");
        Ok(created)
    }

    async fn update(&self, id: Uuid, update: EmployeeUpdate) -> DataResult<Employee> {
        let mut body = serde_json::to_value(&update)?;
        body["updated_at"] = serde_json::json!(Utc::now().to_rfc3339());

        let filter = format!("id=eq.{}", id);
        self.rest.update(TABLE, &filter, &body).await
    }

    async fn delete(&self, id: Uuid) -> DataResult<()> {
        let filter = format!("id=eq.{}", id);
        self.rest.delete(TABLE, &filter).await?;
        tracing::info!(id = %id, "Employee deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), r#""admin""#);
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), r#""user""#);

        let role: Role = serde_json::from_str(r#""admin""#).unwrap();
        assert!(role.is_admin());
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("User".parse::<Role>().unwrap(), Role::User);
        assert!("boss".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_defaults_to_user() {
        // Records predating the role column deserialize as regular users.
        let json = r#"{
            "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "name": "Jane Doe",
            "email": "jane@co.com",
            "department": "Engineering",
            "position": "Developer"
        }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.role, Role::User);
        assert!(employee.created_at.is_none());
    }

    #[test]
    fn test_employee_update_skips_unset_fields() {
        let update = EmployeeUpdate {
            position: Some("Senior Developer".to_string()),
            ..Default::default()
        };

        let value = serde_json::to_value(&update).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["position"], "Senior Developer");
    }
}
