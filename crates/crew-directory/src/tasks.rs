//! Task board model and stores.

use crate::client::SupabaseRest;
use crate::error::DataResult;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Task workflow status. Wire names match the board UI exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// A task assigned to an employee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Employee id this task is assigned to.
    pub assigned_to: Uuid,
    pub due_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields for creating a task.
#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to: Uuid,
    pub due_date: NaiveDate,
}

/// Partial update for a task.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

/// Aggregate task statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    /// Rounded percentage of completed tasks; 0 when there are no tasks.
    pub completion_rate: u32,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count();
        let in_progress = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .count();
        let pending = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .count();

        let completion_rate = if total > 0 {
            ((completed * 100) as f64 / total as f64).round() as u32
        } else {
            0
        };

        Self {
            total,
            pending,
            in_progress,
            completed,
            completion_rate,
        }
    }
}

/// Store trait for the task board.
#[async_trait]
pub trait TaskBoard: Send + Sync {
    /// All tasks, newest first.
    async fn list(&self) -> DataResult<Vec<Task>>;

    /// Create a task.
    async fn create(&self, new: NewTask) -> DataResult<Task>;

    /// Patch mutable fields and bump `updated_at`.
    async fn update(&self, id: Uuid, update: TaskUpdate) -> DataResult<Task>;

    /// Remove a task.
    async fn delete(&self, id: Uuid) -> DataResult<()>;

    /// Status-only transition used by the board.
    async fn set_status(&self, id: Uuid, status: TaskStatus) -> DataResult<Task>;
}

/// Supabase-backed task store.
pub struct SupabaseTasks {
    rest: Arc<SupabaseRest>,
}

const TABLE: &str = "tasks";

impl SupabaseTasks {
    pub fn new(rest: Arc<SupabaseRest>) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl TaskBoard for SupabaseTasks {
    async fn list(&self) -> DataResult<Vec<Task>> {
        self.rest
            .select(TABLE, "select=*&order=created_at.desc")
            .await
    }

    async fn create(&self, new: NewTask) -> DataResult<Task> {
        let created: Task = self.rest.insert(TABLE, &new).await?;
        tracing::info!(title = %created.title, "Task created");
        Ok(created)
    }

    async fn update(&self, id: Uuid, update: TaskUpdate) -> DataResult<Task> {
        let mut body = serde_json::to_value(&update)?;
        body["updated_at"] = serde_json::json!(Utc::now().to_rfc3339());

        let filter = format!("id=eq.{}", id);
        self.rest.update(TABLE, &filter, &body).await
    }

    async fn delete(&self, id: Uuid) -> DataResult<()> {
        let filter = format!("id=eq.{}", id);
        self.rest.delete(TABLE, &filter).await?;
        tracing::info!(id = %id, "Task deleted");
        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: TaskStatus) -> DataResult<Task> {
        let body = serde_json::json!({
            "status": status,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let filter = format!("id=eq.{}", id);
        self.rest.update(TABLE, &filter, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(status: TaskStatus) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            description: String::new(),
            status,
            priority: TaskPriority::Medium,
            assigned_to: Uuid::new_v4(),
            due_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_status_serde_wire_names() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            r#""in-progress""#
        );
        assert_eq!(
            serde_json::to_string(&TaskStatus::Pending).unwrap(),
            r#""pending""#
        );

        let status: TaskStatus = serde_json::from_str(r#""in-progress""#).unwrap();
        assert_eq!(status, TaskStatus::InProgress);
    }

    #[test]
    fn test_priority_serde_wire_names() {
        assert_eq!(
            serde_json::to_string(&TaskPriority::High).unwrap(),
            r#""high""#
        );
        let priority: TaskPriority = serde_json::from_str(r#""low""#).unwrap();
        assert_eq!(priority, TaskPriority::Low);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            "in-progress".parse::<TaskStatus>().unwrap(),
            TaskStatus::InProgress
        );
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_stats_empty() {
        let stats = TaskStats::from_tasks(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_rate, 0);
    }

    #[test]
    fn test_stats_counts_and_rate() {
        let tasks = vec![
            task(TaskStatus::Completed),
            task(TaskStatus::Completed),
            task(TaskStatus::InProgress),
            task(TaskStatus::Pending),
        ];

        let stats = TaskStats::from_tasks(&tasks);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.completion_rate, 50);
    }

    #[test]
    fn test_stats_rate_rounds() {
        let tasks = vec![
            task(TaskStatus::Completed),
            task(TaskStatus::Pending),
            task(TaskStatus::Pending),
        ];

        // 1/3 rounds to 33
        assert_eq!(TaskStats::from_tasks(&tasks).completion_rate, 33);
    }

    #[test]
    fn test_task_update_skips_unset_fields() {
        let update = TaskUpdate {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };

        let value = serde_json::to_value(&update).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(obj["status"], "completed");
    }
}
