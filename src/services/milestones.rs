/// Milestone persistence, lifecycle changes and overdue marking

use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::domain::{
    milestone::{CreateMilestone, UpdateMilestone},
    non_blank, progress, Milestone, MilestoneStatus, Task,
};
use crate::error::{ServiceError, ServiceResult};
use crate::services::required_text;

#[derive(Debug, Clone)]
pub struct MilestoneService {
    pool: SqlitePool,
}

impl MilestoneService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, project_id: Uuid, input: CreateMilestone) -> ServiceResult<Milestone> {
        let title = required_text("title", &input.title)?;
        let position = match input.position {
            Some(position) => position,
            None => self.next_position(project_id).await?,
        };

        let now = Utc::now();
        let milestone = Milestone {
            id: Uuid::new_v4(),
            project_id,
            title,
            description: non_blank(input.description),
            due_date: input.due_date,
            status: MilestoneStatus::NotStarted,
            completed_at: None,
            position,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO milestones (id, project_id, title, description, due_date, status,
                                    completed_at, position, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(milestone.id)
        .bind(milestone.project_id)
        .bind(&milestone.title)
        .bind(&milestone.description)
        .bind(milestone.due_date)
        .bind(milestone.status)
        .bind(milestone.completed_at)
        .bind(milestone.position)
        .bind(milestone.created_at)
        .bind(milestone.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::info!("📍 Created milestone '{}' in project {}", milestone.title, project_id);
        Ok(milestone)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Milestone> {
        sqlx::query_as::<_, Milestone>("SELECT * FROM milestones WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("milestone"))
    }

    pub async fn list(&self, project_id: Uuid) -> ServiceResult<Vec<Milestone>> {
        Ok(sqlx::query_as::<_, Milestone>(
            "SELECT * FROM milestones WHERE project_id = ? ORDER BY position, due_date",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn update(&self, id: Uuid, input: UpdateMilestone) -> ServiceResult<Milestone> {
        let mut milestone = self.get(id).await?;

        if let Some(title) = input.title {
            milestone.title = required_text("title", &title)?;
        }
        if let Some(description) = input.description {
            milestone.description = non_blank(description);
        }
        if let Some(due_date) = input.due_date {
            milestone.due_date = due_date;
        }
        if let Some(position) = input.position {
            milestone.position = position;
        }
        milestone.updated_at = Utc::now();

        sqlx::query(
            "UPDATE milestones SET title = ?, description = ?, due_date = ?, position = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&milestone.title)
        .bind(&milestone.description)
        .bind(milestone.due_date)
        .bind(milestone.position)
        .bind(milestone.updated_at)
        .bind(milestone.id)
        .execute(&self.pool)
        .await?;

        Ok(milestone)
    }

    /// Move the milestone along its lifecycle.
    ///
    /// The update is guarded by the status the transition was validated
    /// against, so a concurrent change can never overwrite a completed milestone.
    pub async fn set_status(&self, id: Uuid, status: MilestoneStatus) -> ServiceResult<Milestone> {
        loop {
            let mut milestone = self.get(id).await?;
            let from = milestone.status;
            if !milestone.apply_status(status, Utc::now())? {
                return Ok(milestone);
            }

            let result = sqlx::query(
                "UPDATE milestones SET status = ?, completed_at = ?, updated_at = ? WHERE id = ? AND status = ?",
            )
            .bind(milestone.status)
            .bind(milestone.completed_at)
            .bind(milestone.updated_at)
            .bind(milestone.id)
            .bind(from)
            .execute(&self.pool)
            .await?;

            // Lost the race; statuses only move forward so this settles
            if result.rows_affected() == 0 {
                tracing::debug!("Milestone {} changed concurrently, re-checking {}", id, status);
                continue;
            }

            tracing::info!("🔄 Milestone {} moved {} → {}", id, from, milestone.status);
            return Ok(milestone);
        }
    }

    /// Delete a milestone; its tasks stay in the project without a milestone
    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM milestones WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("milestone"));
        }
        Ok(())
    }

    /// Transition every open milestone past its due date to `overdue`.
    /// Returns the number of milestones changed.
    pub async fn mark_overdue(&self, today: NaiveDate) -> ServiceResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE milestones SET status = ?, updated_at = ?
            WHERE status IN (?, ?) AND due_date < ?
            "#,
        )
        .bind(MilestoneStatus::Overdue)
        .bind(Utc::now())
        .bind(MilestoneStatus::NotStarted)
        .bind(MilestoneStatus::InProgress)
        .bind(today)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Completion percentage of the milestone's tasks
    pub async fn progress(&self, id: Uuid) -> ServiceResult<f64> {
        let tasks = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE milestone_id = ?")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(progress::percent_complete(&tasks))
    }

    async fn next_position(&self, project_id: Uuid) -> ServiceResult<i64> {
        let (max,): (Option<i64>,) =
            sqlx::query_as("SELECT MAX(position) FROM milestones WHERE project_id = ?")
                .bind(project_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(max.map_or(0, |p| p + 1))
    }
}
