//! Task board commands.

use super::AppContext;
use crate::output::{self, OutputFormat};
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use crew_directory::{EmployeeDirectory, NewTask, TaskBoard, TaskPriority, TaskStats, TaskStatus};
use uuid::Uuid;

/// List tasks. Admins see the whole board; everyone else sees the tasks
/// assigned to them.
pub async fn task_list(context: &AppContext, format: &OutputFormat) -> Result<()> {
    let snapshot = context.require_signed_in()?;

    let mut tasks = context.tasks.list().await?;

    if !snapshot.is_admin() {
        match snapshot.profile.as_ref() {
            Some(profile) => tasks.retain(|t| t.assigned_to == profile.id),
            None => tasks.clear(),
        }
    }

    match format {
        OutputFormat::Text => {
            output::print_heading(&format!("Tasks ({})", tasks.len()));
            for task in &tasks {
                println!(
                    "  {:<36}  [{:<11}] {:<6} due {}  {}",
                    task.id, task.status, task.priority, task.due_date, task.title,
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&tasks)?);
        }
    }
    Ok(())
}

/// Create a task (admin only).
pub async fn task_add(
    context: &AppContext,
    title: String,
    description: String,
    priority: TaskPriority,
    assignee: String,
    due: NaiveDate,
    format: &OutputFormat,
) -> Result<()> {
    context.require_admin()?;

    let assignee = context
        .employees
        .find_by_email(&assignee)
        .await?
        .ok_or_else(|| anyhow!("No employee with email {}", assignee))?;

    let task = context
        .tasks
        .create(NewTask {
            title,
            description,
            status: TaskStatus::Pending,
            priority,
            assigned_to: assignee.id,
            due_date: due,
        })
        .await?;

    output::print_success(
        &format!("Created \"{}\" ({})", task.title, task.id),
        format,
    );
    Ok(())
}

/// Mark a task completed.
pub async fn task_done(context: &AppContext, id: Uuid, format: &OutputFormat) -> Result<()> {
    context.require_signed_in()?;

    let task = context.tasks.set_status(id, TaskStatus::Completed).await?;
    output::print_success(&format!("\"{}\" is now {}", task.title, task.status), format);
    Ok(())
}

/// Remove a task (admin only).
pub async fn task_remove(context: &AppContext, id: Uuid, format: &OutputFormat) -> Result<()> {
    context.require_admin()?;

    context.tasks.delete(id).await?;
    output::print_success(&format!("Removed task {}", id), format);
    Ok(())
}

/// Show task statistics.
pub async fn stats(context: &AppContext, format: &OutputFormat) -> Result<()> {
    context.require_signed_in()?;

    let tasks = context.tasks.list().await?;
    let stats = TaskStats::from_tasks(&tasks);

    match format {
        OutputFormat::Text => {
            output::print_heading("Task stats");
            output::print_row("Total", &stats.total.to_string());
            output::print_row("Pending", &stats.pending.to_string());
            output::print_row("In progress", &stats.in_progress.to_string());
            output::print_row("Completed", &stats.completed.to_string());
            output::print_row("Completion", &format!("{}%", stats.completion_rate));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}
