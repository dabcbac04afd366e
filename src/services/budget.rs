/// Budget persistence and total recalculation
///
/// Stored totals are derived data. Every write to budget items (here) or to
/// priced tasks (`TaskService`) calls `recompute_totals` on the same
/// transaction, so the stored totals always equal the sum of the children.

use chrono::Utc;
use sqlx::{sqlite::SqlitePool, SqliteConnection};
use uuid::Uuid;

use crate::domain::{
    budget::{CreateBudgetItem, UpdateBudgetItem},
    validate_amount, Budget, BudgetItem, BudgetTotals, BudgetView, Task,
};
use crate::error::{ServiceError, ServiceResult};
use crate::services::required_text;

#[derive(Debug, Clone)]
pub struct BudgetService {
    pool: SqlitePool,
}

impl BudgetService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Budget of a project with variance and alert level
    pub async fn get(&self, project_id: Uuid) -> ServiceResult<BudgetView> {
        Ok(self.load(project_id).await?.into())
    }

    pub async fn list_items(&self, project_id: Uuid) -> ServiceResult<Vec<BudgetItem>> {
        Ok(sqlx::query_as::<_, BudgetItem>(
            r#"
            SELECT bi.* FROM budget_items bi
            JOIN budgets b ON b.id = bi.budget_id
            WHERE b.project_id = ?
            ORDER BY bi.category, bi.created_at
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn add_item(&self, project_id: Uuid, input: CreateBudgetItem) -> ServiceResult<BudgetItem> {
        let category = required_text("category", &input.category)?;
        let description = required_text("description", &input.description)?;
        validate_amount("estimated_cost", input.estimated_cost)?;
        validate_amount("actual_cost", input.actual_cost)?;

        let budget = self.load(project_id).await?;
        let now = Utc::now();
        let item = BudgetItem {
            id: Uuid::new_v4(),
            budget_id: budget.id,
            category,
            description,
            estimated_cost: input.estimated_cost,
            actual_cost: input.actual_cost,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO budget_items (id, budget_id, category, description, estimated_cost,
                                      actual_cost, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.id)
        .bind(item.budget_id)
        .bind(&item.category)
        .bind(&item.description)
        .bind(item.estimated_cost)
        .bind(item.actual_cost)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await?;
        recompute_totals(&mut *tx, project_id).await?;
        tx.commit().await?;

        Ok(item)
    }

    pub async fn get_item(&self, item_id: Uuid) -> ServiceResult<BudgetItem> {
        sqlx::query_as::<_, BudgetItem>("SELECT * FROM budget_items WHERE id = ?")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("budget item"))
    }

    /// Project owning a budget item, for access checks
    pub async fn item_project(&self, item_id: Uuid) -> ServiceResult<Uuid> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT b.project_id FROM budget_items bi JOIN budgets b ON b.id = bi.budget_id WHERE bi.id = ?",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|(project_id,)| project_id)
            .ok_or(ServiceError::NotFound("budget item"))
    }

    pub async fn update_item(&self, item_id: Uuid, input: UpdateBudgetItem) -> ServiceResult<BudgetItem> {
        let mut item = self.get_item(item_id).await?;
        let project_id = self.item_project(item_id).await?;

        if let Some(category) = input.category {
            item.category = required_text("category", &category)?;
        }
        if let Some(description) = input.description {
            item.description = required_text("description", &description)?;
        }
        if let Some(estimated_cost) = input.estimated_cost {
            validate_amount("estimated_cost", estimated_cost)?;
            item.estimated_cost = estimated_cost;
        }
        if let Some(actual_cost) = input.actual_cost {
            validate_amount("actual_cost", actual_cost)?;
            item.actual_cost = actual_cost;
        }
        item.updated_at = Utc::now();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            UPDATE budget_items SET category = ?, description = ?, estimated_cost = ?,
                actual_cost = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&item.category)
        .bind(&item.description)
        .bind(item.estimated_cost)
        .bind(item.actual_cost)
        .bind(item.updated_at)
        .bind(item.id)
        .execute(&mut *tx)
        .await?;
        recompute_totals(&mut *tx, project_id).await?;
        tx.commit().await?;

        Ok(item)
    }

    pub async fn delete_item(&self, item_id: Uuid) -> ServiceResult<()> {
        let project_id = self.item_project(item_id).await?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM budget_items WHERE id = ?")
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        recompute_totals(&mut *tx, project_id).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Recompute and store totals on demand
    pub async fn recalculate(&self, project_id: Uuid) -> ServiceResult<BudgetView> {
        let mut tx = self.pool.begin().await?;
        let totals = recompute_totals(&mut *tx, project_id).await?;
        tx.commit().await?;

        tracing::info!(
            "💰 Recalculated budget for project {}: estimated {:.2}, actual {:.2}",
            project_id,
            totals.total_estimated,
            totals.total_actual
        );
        self.get(project_id).await
    }

    async fn load(&self, project_id: Uuid) -> ServiceResult<Budget> {
        sqlx::query_as::<_, Budget>("SELECT * FROM budgets WHERE project_id = ?")
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("budget"))
    }
}

/// Sum the project's budget items and priced tasks and store the result.
///
/// Runs on the caller's connection so it joins the caller's transaction.
pub(crate) async fn recompute_totals(
    conn: &mut SqliteConnection,
    project_id: Uuid,
) -> ServiceResult<BudgetTotals> {
    let items = sqlx::query_as::<_, BudgetItem>(
        r#"
        SELECT bi.* FROM budget_items bi
        JOIN budgets b ON b.id = bi.budget_id
        WHERE b.project_id = ?
        "#,
    )
    .bind(project_id)
    .fetch_all(&mut *conn)
    .await?;

    let tasks = sqlx::query_as::<_, Task>(
        "SELECT * FROM tasks WHERE project_id = ? AND (estimated_price IS NOT NULL OR actual_price IS NOT NULL)",
    )
    .bind(project_id)
    .fetch_all(&mut *conn)
    .await?;

    let totals = BudgetTotals::compute(&items, &tasks);
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE budgets SET
            total_estimated = ?, total_actual = ?,
            items_estimated = ?, items_actual = ?,
            tasks_estimated = ?, tasks_actual = ?,
            recalculated_at = ?, updated_at = ?
        WHERE project_id = ?
        "#,
    )
    .bind(totals.total_estimated)
    .bind(totals.total_actual)
    .bind(totals.items_estimated)
    .bind(totals.items_actual)
    .bind(totals.tasks_estimated)
    .bind(totals.tasks_actual)
    .bind(now)
    .bind(now)
    .bind(project_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::NotFound("budget"));
    }

    tracing::debug!(
        "Budget totals for project {}: {} items, {} priced tasks, alert {}",
        project_id,
        items.len(),
        tasks.len(),
        totals.alert()
    );
    Ok(totals)
}
