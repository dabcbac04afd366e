/// Tasks: units of renovation work, optionally priced
///
/// A task carrying an estimated or actual price feeds the project budget.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::double_option;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    sqlx::Type,
    strum::Display,
    strum::EnumString,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Cancelled,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    sqlx::Type,
    strum::Display,
    strum::EnumString,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub milestone_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    /// Template this task was created from, if any
    pub template_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub estimated_price: Option<f64>,
    pub actual_price: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Tasks with any price take part in budget aggregation
    pub fn is_priced(&self) -> bool {
        self.estimated_price.is_some() || self.actual_price.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub milestone_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub estimated_price: Option<f64>,
    pub actual_price: Option<f64>,
    #[serde(skip)]
    pub template_id: Option<Uuid>,
}

impl CreateTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            milestone_id: None,
            assignee_id: None,
            status: None,
            priority: None,
            due_date: None,
            estimated_price: None,
            actual_price: None,
            template_id: None,
        }
    }
}

/// Partial update; `null` clears optional fields (including prices)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub milestone_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub estimated_price: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub actual_price: Option<Option<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub milestone_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub search: Option<String>,
}

/// Bulk creation from work item templates
#[derive(Debug, Clone, Deserialize)]
pub struct TasksFromTemplates {
    pub template_ids: Vec<Uuid>,
    pub milestone_id: Option<Uuid>,
    /// Due dates are computed from this date plus each template's duration
    pub start_date: Option<NaiveDate>,
}
