//! In-memory store for tests and local development.

use crate::employees::{Employee, EmployeeDirectory, EmployeeUpdate, NewEmployee};
use crate::error::{DataError, DataResult};
use crate::tasks::{NewTask, Task, TaskBoard, TaskStatus, TaskUpdate};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use uuid::Uuid;

/// In-memory `EmployeeDirectory` + `TaskBoard` with the same semantics as
/// the Supabase-backed stores (newest first, duplicate-name rejection).
#[derive(Default)]
pub struct MemoryDirectory {
    employees: Mutex<Vec<Employee>>,
    tasks: Mutex<Vec<Task>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryDirectory {
    async fn list(&self) -> DataResult<Vec<Employee>> {
        Ok(self.employees.lock().unwrap().clone())
    }

    async fn find_by_name(&self, name: &str) -> DataResult<Vec<Employee>> {
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
        Ok(self
            .employees
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.email == email)
            .cloned())
    }

    async fn create(&self, new: NewEmployee) -> DataResult<Employee> {
        let mut employees = self.employees.lock().unwrap();

        if employees.iter().any(|e| e.name == new.name) {
            return Err(DataError::Conflict(format!(
                "an employee named {} already exists",
                new.name
            )));
        }

        let employee = Employee {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            role: new.role,
            department: new.department,
            position: new.position,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        // Newest first, matching order=created_at.desc
        employees.insert(0, employee.clone());
        Ok(employee)
    }

    async fn update(&self, id: Uuid, update: EmployeeUpdate) -> DataResult<Employee> {
        let mut employees = self.employees.lock().unwrap();
        let employee = employees
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| DataError::NotFound(format!("no employee with id {}", id)))?;

        if let Some(name) = update.name {
            employee.name = name;
        }
        if let Some(email) = update.email {
            employee.email = email;
        }
        if let Some(role) = update.role {
            employee.role = role;
        }
        if let Some(department) = update.department {
            employee.department = department;
        }
        if let Some(position) = update.position {
            employee.position = position;
        }
        employee.updated_at = Some(Utc::now());

        Ok(employee.clone())
    }

    async fn delete(&self, id: Uuid) -> DataResult<()> {
        let mut employees = self.employees.lock().unwrap();
        let before = employees.len();
        employees.retain(|e| e.id != id);

        if employees.len() == before {
            return Err(DataError::NotFound(format!("no employee with id {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskBoard for MemoryDirectory {
    async fn list(&self) -> DataResult<Vec<Task>> {
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn create(&self, new: NewTask) -> DataResult<Task> {
        let task = Task {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            assigned_to: new.assigned_to,
            due_date: new.due_date,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        self.tasks.lock().unwrap().insert(0, task.clone());
        Ok(task)
    }

    async fn update(&self, id: Uuid, update: TaskUpdate) -> DataResult<Task> {
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| DataError::NotFound(format!("no task with id {}", id)))?;

        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(assigned_to) = update.assigned_to {
            task.assigned_to = assigned_to;
        }
        if let Some(due_date) = update.due_date {
            task.due_date = due_date;
        }
        task.updated_at = Some(Utc::now());

        Ok(task.clone())
    }

    async fn delete(&self, id: Uuid) -> DataResult<()> {
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);

        if tasks.len() == before {
            return Err(DataError::NotFound(format!("no task with id {}", id)));
        }
        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: TaskStatus) -> DataResult<Task> {
        TaskBoard::update(
            self,
            id,
            TaskUpdate {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }
}
