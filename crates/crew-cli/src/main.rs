//! Crewdeck CLI - employee and task management from the terminal.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use chrono::NaiveDate;
use crew_directory::{Role, TaskPriority};
use uuid::Uuid;

/// Crewdeck CLI - sign in and manage the roster and task board.
#[derive(Parser)]
#[command(name = "crew")]
#[command(about = "Crewdeck CLI for employee and task management")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with a display name or email
    Login {
        /// Display name or email; prompted for when omitted
        identifier: Option<String>,
    },

    /// Sign out and clear the persisted session
    Logout,

    /// Show session and profile status
    Status,

    /// Manage the employee roster
    Employee {
        #[command(subcommand)]
        command: EmployeeCommands,
    },

    /// Manage the task board
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Show task statistics
    Stats,
}

#[derive(Subcommand)]
enum EmployeeCommands {
    /// List employees
    List,
    /// Add an employee (admin only)
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Role (admin or user)
        #[arg(long, default_value = "user")]
        role: Role,
        #[arg(long)]
        department: String,
        #[arg(long)]
        position: String,
    },
    /// Remove an employee (admin only)
    Remove {
        /// Employee ID
        id: Uuid,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// List tasks (admins see all, others their own)
    List,
    /// Create a task (admin only)
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Priority (low, medium, high)
        #[arg(long, default_value = "medium")]
        priority: TaskPriority,
        /// Email of the assignee
        #[arg(long)]
        assignee: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: NaiveDate,
    },
    /// Mark a task completed
    Done {
        /// Task ID
        id: Uuid,
    },
    /// Remove a task (admin only)
    Remove {
        /// Task ID
        id: Uuid,
    },
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let context = commands::AppContext::init().await?;
    let format = cli.format;

    let result = match cli.command {
        Commands::Login { identifier } => commands::login(&context, identifier, &format).await,
        Commands::Logout => commands::logout(&context, &format).await,
        Commands::Status => commands::status(&context, &format).await,
        Commands::Employee { command } => match command {
            EmployeeCommands::List => commands::employee_list(&context, &format).await,
            EmployeeCommands::Add {
                name,
                email,
                role,
                department,
                position,
            } => {
                commands::employee_add(&context, name, email, role, department, position, &format)
                    .await
            }
            EmployeeCommands::Remove { id } => {
                commands::employee_remove(&context, id, &format).await
            }
        },
        Commands::Task { command } => match command {
            TaskCommands::List => commands::task_list(&context, &format).await,
            TaskCommands::Add {
                title,
                description,
                priority,
                assignee,
                due,
            } => {
                commands::task_add(&context, title, description, priority, assignee, due, &format)
                    .await
            }
            TaskCommands::Done { id } => commands::task_done(&context, id, &format).await,
            TaskCommands::Remove { id } => commands::task_remove(&context, id, &format).await,
        },
        Commands::Stats => commands::stats(&context, &format).await,
    };

    context.runtime.shutdown();
    result
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    crew_core::init_logging(&cli.log_level);

    let format = cli.format;
    if let Err(error) = run(cli).await {
        output::print_error(&format!("{:#}", error), &format);
        std::process::exit(1);
    }
}
