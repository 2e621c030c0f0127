//! Supabase-backed data access for the crewdeck employee roster and task board.
//!
//! This crate provides:
//! - A thin PostgREST client for the Supabase REST API
//! - The `Employee` and `Task` models with their store traits
//! - An in-memory store implementation for tests and local development

mod client;
mod employees;
mod error;
mod memory;
mod tasks;

pub use client::SupabaseRest;
pub use employees::{
    Employee, EmployeeDirectory, EmployeeUpdate, NewEmployee, Role, SupabaseEmployees,
};
pub use error::{DataError, DataResult};
pub use memory::MemoryDirectory;
pub use tasks::{
    NewTask, SupabaseTasks, Task, TaskBoard, TaskPriority, TaskStats, TaskStatus, TaskUpdate,
};
