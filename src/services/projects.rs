/// Project persistence, ownership checks and progress reporting

use chrono::{NaiveDate, Utc};
use sqlx::{sqlite::SqlitePool, QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::domain::{
    non_blank,
    project::{validate_schedule, CreateProject, ProjectFilter, UpdateProject},
    Milestone, ProgressSummary, Project, Resource, Task,
};
use crate::error::{ServiceError, ServiceResult};
use crate::services::{required_text, SearchTerm};
use crate::storage::FileStore;

pub const DEFAULT_CURRENCY: &str = "EUR";

#[derive(Debug, Clone)]
pub struct ProjectService {
    pool: SqlitePool,
    files: FileStore,
}

impl ProjectService {
    pub fn new(pool: SqlitePool, files: FileStore) -> Self {
        Self { pool, files }
    }

    /// Create a project together with its empty budget
    pub async fn create(&self, owner_id: Uuid, input: CreateProject) -> ServiceResult<Project> {
        let name = required_text("name", &input.name)?;
        validate_schedule(input.start_date, input.target_end_date)?;
        let currency = currency_code(input.currency.as_deref())?;

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            owner_id,
            name,
            description: non_blank(input.description),
            address: non_blank(input.address),
            status: input.status.unwrap_or_default(),
            start_date: input.start_date,
            target_end_date: input.target_end_date,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO projects (id, owner_id, name, description, address, status,
                                  start_date, target_end_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(project.id)
        .bind(project.owner_id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.address)
        .bind(project.status)
        .bind(project.start_date)
        .bind(project.target_end_date)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO budgets (id, project_id, currency, recalculated_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(project.id)
        .bind(&currency)
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!("🏗️ Created project {} ({})", project.id, project.name);
        Ok(project)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Project> {
        sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("project"))
    }

    /// Load a project and check it belongs to `user_id`
    pub async fn ensure_owner(&self, id: Uuid, user_id: Uuid) -> ServiceResult<Project> {
        let project = self.get(id).await?;
        if project.owner_id != user_id {
            return Err(ServiceError::Forbidden("project"));
        }
        Ok(project)
    }

    pub async fn list(&self, owner_id: Uuid, filter: &ProjectFilter) -> ServiceResult<Vec<Project>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM projects WHERE owner_id = ");
        query.push_bind(owner_id);

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        query.push(" ORDER BY updated_at DESC");

        let projects = query.build_query_as::<Project>().fetch_all(&self.pool).await?;
        Ok(match SearchTerm::parse(filter.search.as_deref()) {
            Some(term) => projects
                .into_iter()
                .filter(|p| term.matches([Some(p.name.as_str()), p.description.as_deref(), p.address.as_deref()]))
                .collect(),
            None => projects,
        })
    }

    pub async fn update(&self, id: Uuid, input: UpdateProject) -> ServiceResult<Project> {
        let mut project = self.get(id).await?;

        if let Some(name) = input.name {
            project.name = required_text("name", &name)?;
        }
        if let Some(description) = input.description {
            project.description = non_blank(description);
        }
        if let Some(address) = input.address {
            project.address = non_blank(address);
        }
        if let Some(status) = input.status {
            project.status = status;
        }
        if let Some(start_date) = input.start_date {
            project.start_date = start_date;
        }
        if let Some(target_end_date) = input.target_end_date {
            project.target_end_date = target_end_date;
        }
        validate_schedule(project.start_date, project.target_end_date)?;
        project.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE projects SET name = ?, description = ?, address = ?, status = ?,
                start_date = ?, target_end_date = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.address)
        .bind(project.status)
        .bind(project.start_date)
        .bind(project.target_end_date)
        .bind(project.updated_at)
        .bind(project.id)
        .execute(&self.pool)
        .await?;

        Ok(project)
    }

    /// Delete a project, its children (cascade) and its stored files
    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("project"));
        }

        self.files.delete_project(id).await?;
        tracing::info!("🗑️ Deleted project {}", id);
        Ok(())
    }

    /// Task/milestone counts, completion percentage and overdue indicators
    pub async fn progress(&self, id: Uuid, today: NaiveDate) -> ServiceResult<ProgressSummary> {
        let tasks = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE project_id = ?")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        let milestones = sqlx::query_as::<_, Milestone>("SELECT * FROM milestones WHERE project_id = ?")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        let resources = sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE project_id = ?")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ProgressSummary::compute(&tasks, &milestones, &resources, today))
    }
}

/// Three-letter uppercase currency code, EUR when absent
fn currency_code(code: Option<&str>) -> ServiceResult<String> {
    let code = code.map(str::trim).filter(|c| !c.is_empty()).unwrap_or(DEFAULT_CURRENCY);
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ServiceError::validation("currency must be a three-letter code"));
    }
    Ok(code.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::currency_code;

    #[test]
    fn currency_codes() {
        assert_eq!(currency_code(None).unwrap(), "EUR");
        assert_eq!(currency_code(Some("usd")).unwrap(), "USD");
        assert!(currency_code(Some("dollars")).is_err());
        assert!(currency_code(Some("U$D")).is_err());
    }
}
