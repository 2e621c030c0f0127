//! Employee roster commands.

use super::AppContext;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use crew_directory::{EmployeeDirectory, NewEmployee, Role};
use uuid::Uuid;

/// List the employee roster.
pub async fn employee_list(context: &AppContext, format: &OutputFormat) -> Result<()> {
    context.require_signed_in()?;

    let employees = context.employees.list().await?;

    match format {
        OutputFormat::Text => {
            output::print_heading(&format!("Employees ({})", employees.len()));
            for employee in &employees {
                println!(
                    "  {:<36}  {:<24} {:<6} {} / {}",
                    employee.id,
                    format!("{} <{}>", employee.name, employee.email),
                    employee.role,
                    employee.department,
                    employee.position,
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&employees)?);
        }
    }
    Ok(())
}

/// Add an employee (admin only).
#[allow(clippy::too_many_arguments)]
pub async fn employee_add(
    context: &AppContext,
    name: String,
    email: String,
    role: Role,
    department: String,
    position: String,
    format: &OutputFormat,
) -> Result<()> {
    context.require_admin()?;

    let employee = context
        .employees
        .create(NewEmployee {
            name,
            email,
            role,
            department,
            position,
        })
        .await?;

    output::print_success(
        &format!("Added {} ({})", employee.name, employee.id),
        format,
    );
    Ok(())
}

/// Remove an employee (admin only).
pub async fn employee_remove(context: &AppContext, id: Uuid, format: &OutputFormat) -> Result<()> {
    context.require_admin()?;

    context.employees.delete(id).await?;
    output::print_success(&format!("Removed employee {}", id), format);
    Ok(())
}
