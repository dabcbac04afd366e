/// Task persistence, filtering and template expansion
///
/// Writes that involve a priced task (before or after the change) recompute
/// the project budget inside the same transaction.

use chrono::{NaiveDate, Utc};
use sqlx::{sqlite::SqlitePool, QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::domain::{
    non_blank,
    task::{CreateTask, TaskFilter, UpdateTask},
    validate_amount, Task, WorkItemTemplate,
};
use crate::error::{ServiceError, ServiceResult};
use crate::services::{budget::recompute_totals, required_text, SearchTerm};

#[derive(Debug, Clone)]
pub struct TaskService {
    pool: SqlitePool,
}

impl TaskService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, project_id: Uuid, input: CreateTask) -> ServiceResult<Task> {
        let task = self.build_task(project_id, input).await?;

        let mut tx = self.pool.begin().await?;
        insert_task(&mut *tx, &task).await?;
        if task.is_priced() {
            recompute_totals(&mut *tx, project_id).await?;
        }
        tx.commit().await?;

        tracing::info!("📝 Created task '{}' in project {}", task.title, project_id);
        Ok(task)
    }

    /// Create one task per template, in template order, within a single transaction
    pub async fn create_from_templates(
        &self,
        project_id: Uuid,
        templates: &[WorkItemTemplate],
        milestone_id: Option<Uuid>,
        start_date: Option<NaiveDate>,
    ) -> ServiceResult<Vec<Task>> {
        if templates.is_empty() {
            return Err(ServiceError::validation("at least one template is required"));
        }

        let mut tasks = Vec::with_capacity(templates.len());
        for template in templates {
            let task = self
                .build_task(project_id, template.to_task(milestone_id, start_date))
                .await?;
            tasks.push(task);
        }

        let mut tx = self.pool.begin().await?;
        for task in &tasks {
            insert_task(&mut *tx, task).await?;
        }
        if tasks.iter().any(Task::is_priced) {
            recompute_totals(&mut *tx, project_id).await?;
        }
        tx.commit().await?;

        tracing::info!("📋 Created {} tasks from templates in project {}", tasks.len(), project_id);
        Ok(tasks)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Task> {
        sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("task"))
    }

    pub async fn list(&self, project_id: Uuid, filter: &TaskFilter) -> ServiceResult<Vec<Task>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM tasks WHERE project_id = ");
        query.push_bind(project_id);

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(milestone_id) = filter.milestone_id {
            query.push(" AND milestone_id = ").push_bind(milestone_id);
        }
        if let Some(assignee_id) = filter.assignee_id {
            query.push(" AND assignee_id = ").push_bind(assignee_id);
        }
        query.push(" ORDER BY due_date IS NULL, due_date, created_at");

        let tasks = query.build_query_as::<Task>().fetch_all(&self.pool).await?;
        Ok(match SearchTerm::parse(filter.search.as_deref()) {
            Some(term) => tasks
                .into_iter()
                .filter(|t| term.matches([Some(t.title.as_str()), t.description.as_deref()]))
                .collect(),
            None => tasks,
        })
    }

    pub async fn update(&self, id: Uuid, input: UpdateTask) -> ServiceResult<Task> {
        let before = self.get(id).await?;
        let mut task = before.clone();

        if let Some(title) = input.title {
            task.title = required_text("title", &title)?;
        }
        if let Some(description) = input.description {
            task.description = non_blank(description);
        }
        if let Some(milestone_id) = input.milestone_id {
            if let Some(milestone_id) = milestone_id {
                self.check_milestone(task.project_id, milestone_id).await?;
            }
            task.milestone_id = milestone_id;
        }
        if let Some(assignee_id) = input.assignee_id {
            if let Some(assignee_id) = assignee_id {
                self.check_assignee(assignee_id).await?;
            }
            task.assignee_id = assignee_id;
        }
        if let Some(status) = input.status {
            task.status = status;
        }
        if let Some(priority) = input.priority {
            task.priority = priority;
        }
        if let Some(due_date) = input.due_date {
            task.due_date = due_date;
        }
        if let Some(estimated_price) = input.estimated_price {
            validate_price("estimated_price", estimated_price)?;
            task.estimated_price = estimated_price;
        }
        if let Some(actual_price) = input.actual_price {
            validate_price("actual_price", actual_price)?;
            task.actual_price = actual_price;
        }
        task.updated_at = Utc::now();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            UPDATE tasks SET milestone_id = ?, assignee_id = ?, title = ?, description = ?,
                status = ?, priority = ?, due_date = ?, estimated_price = ?, actual_price = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(task.milestone_id)
        .bind(task.assignee_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.due_date)
        .bind(task.estimated_price)
        .bind(task.actual_price)
        .bind(task.updated_at)
        .bind(task.id)
        .execute(&mut *tx)
        .await?;
        if before.is_priced() || task.is_priced() {
            recompute_totals(&mut *tx, task.project_id).await?;
        }
        tx.commit().await?;

        Ok(task)
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let task = self.get(id).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if task.is_priced() {
            recompute_totals(&mut *tx, task.project_id).await?;
        }
        tx.commit().await?;

        Ok(())
    }

    /// Validate a creation payload and turn it into a task row
    async fn build_task(&self, project_id: Uuid, input: CreateTask) -> ServiceResult<Task> {
        let title = required_text("title", &input.title)?;
        validate_price("estimated_price", input.estimated_price)?;
        validate_price("actual_price", input.actual_price)?;
        if let Some(milestone_id) = input.milestone_id {
            self.check_milestone(project_id, milestone_id).await?;
        }
        if let Some(assignee_id) = input.assignee_id {
            self.check_assignee(assignee_id).await?;
        }

        let now = Utc::now();
        Ok(Task {
            id: Uuid::new_v4(),
            project_id,
            milestone_id: input.milestone_id,
            assignee_id: input.assignee_id,
            template_id: input.template_id,
            title,
            description: non_blank(input.description),
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            due_date: input.due_date,
            estimated_price: input.estimated_price,
            actual_price: input.actual_price,
            created_at: now,
            updated_at: now,
        })
    }

    /// A task may only reference a milestone of its own project
    async fn check_milestone(&self, project_id: Uuid, milestone_id: Uuid) -> ServiceResult<()> {
        let owner: Option<(Uuid,)> = sqlx::query_as("SELECT project_id FROM milestones WHERE id = ?")
            .bind(milestone_id)
            .fetch_optional(&self.pool)
            .await?;
        match owner {
            Some((owner,)) if owner == project_id => Ok(()),
            Some(_) => Err(ServiceError::validation("milestone belongs to another project")),
            None => Err(ServiceError::validation("milestone does not exist")),
        }
    }

    async fn check_assignee(&self, user_id: Uuid) -> ServiceResult<()> {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        exists
            .map(|_| ())
            .ok_or_else(|| ServiceError::validation("assignee does not exist"))
    }
}

fn validate_price(field: &str, price: Option<f64>) -> ServiceResult<()> {
    match price {
        Some(price) => validate_amount(field, price),
        None => Ok(()),
    }
}

async fn insert_task(conn: &mut SqliteConnection, task: &Task) -> ServiceResult<()> {
    sqlx::query(
        r#"
        INSERT INTO tasks (id, project_id, milestone_id, assignee_id, template_id, title,
                           description, status, priority, due_date, estimated_price,
                           actual_price, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(task.id)
    .bind(task.project_id)
    .bind(task.milestone_id)
    .bind(task.assignee_id)
    .bind(task.template_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.status)
    .bind(task.priority)
    .bind(task.due_date)
    .bind(task.estimated_price)
    .bind(task.actual_price)
    .bind(task.created_at)
    .bind(task.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}
