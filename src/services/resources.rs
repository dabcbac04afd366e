/// Resource procurement: materials, equipment and subcontractors per project

use chrono::{NaiveDate, Utc};
use sqlx::{sqlite::SqlitePool, QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::domain::{
    non_blank,
    resource::{CreateResource, ResourceFilter, UpdateResource},
    validate_amount, Resource, ResourceStatus,
};
use crate::error::{ServiceError, ServiceResult};
use crate::services::required_text;

#[derive(Debug, Clone)]
pub struct ResourceService {
    pool: SqlitePool,
}

impl ResourceService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, project_id: Uuid, input: CreateResource) -> ServiceResult<Resource> {
        let name = required_text("name", &input.name)?;
        let quantity = input.quantity.unwrap_or(1.0);
        validate_quantity(quantity)?;
        if let Some(unit_cost) = input.unit_cost {
            validate_amount("unit_cost", unit_cost)?;
        }
        if let Some(supplier_id) = input.supplier_id {
            self.check_supplier(project_id, supplier_id).await?;
        }

        let now = Utc::now();
        let resource = Resource {
            id: Uuid::new_v4(),
            project_id,
            supplier_id: input.supplier_id,
            name,
            kind: input.kind.unwrap_or_default(),
            quantity,
            unit: non_blank(input.unit),
            unit_cost: input.unit_cost,
            status: ResourceStatus::Needed,
            ordered_at: None,
            expected_delivery: input.expected_delivery,
            received_at: None,
            notes: non_blank(input.notes),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO resources (id, project_id, supplier_id, name, kind, quantity, unit,
                                   unit_cost, status, ordered_at, expected_delivery,
                                   received_at, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(resource.id)
        .bind(resource.project_id)
        .bind(resource.supplier_id)
        .bind(&resource.name)
        .bind(resource.kind)
        .bind(resource.quantity)
        .bind(&resource.unit)
        .bind(resource.unit_cost)
        .bind(resource.status)
        .bind(resource.ordered_at)
        .bind(resource.expected_delivery)
        .bind(resource.received_at)
        .bind(&resource.notes)
        .bind(resource.created_at)
        .bind(resource.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::info!("📦 Added {} '{}' to project {}", resource.kind, resource.name, project_id);
        Ok(resource)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Resource> {
        sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("resource"))
    }

    pub async fn list(
        &self,
        project_id: Uuid,
        filter: &ResourceFilter,
        today: NaiveDate,
    ) -> ServiceResult<Vec<Resource>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM resources WHERE project_id = ");
        query.push_bind(project_id);

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if filter.overdue {
            query
                .push(" AND status = ")
                .push_bind(ResourceStatus::Ordered)
                .push(" AND expected_delivery < ")
                .push_bind(today);
        }
        query.push(" ORDER BY expected_delivery IS NULL, expected_delivery, created_at");

        Ok(query.build_query_as::<Resource>().fetch_all(&self.pool).await?)
    }

    pub async fn update(&self, id: Uuid, input: UpdateResource) -> ServiceResult<Resource> {
        let mut resource = self.get(id).await?;

        if let Some(name) = input.name {
            resource.name = required_text("name", &name)?;
        }
        if let Some(kind) = input.kind {
            resource.kind = kind;
        }
        if let Some(supplier_id) = input.supplier_id {
            if let Some(supplier_id) = supplier_id {
                self.check_supplier(resource.project_id, supplier_id).await?;
            }
            resource.supplier_id = supplier_id;
        }
        if let Some(quantity) = input.quantity {
            validate_quantity(quantity)?;
            resource.quantity = quantity;
        }
        if let Some(unit) = input.unit {
            resource.unit = non_blank(unit);
        }
        if let Some(unit_cost) = input.unit_cost {
            if let Some(cost) = unit_cost {
                validate_amount("unit_cost", cost)?;
            }
            resource.unit_cost = unit_cost;
        }
        if let Some(expected_delivery) = input.expected_delivery {
            resource.expected_delivery = expected_delivery;
        }
        if let Some(notes) = input.notes {
            resource.notes = non_blank(notes);
        }
        resource.updated_at = Utc::now();

        self.save(&resource).await?;
        Ok(resource)
    }

    /// Move the resource along the procurement lifecycle.
    ///
    /// The write only lands while the stored status still matches the one the
    /// transition was checked against; otherwise the change is re-evaluated.
    pub async fn set_status(
        &self,
        id: Uuid,
        status: ResourceStatus,
        expected_delivery: Option<NaiveDate>,
    ) -> ServiceResult<Resource> {
        loop {
            let mut resource = self.get(id).await?;
            let from = resource.status;
            let changed = resource.apply_status(status, Utc::now())?;

            if let Some(expected) = expected_delivery {
                resource.expected_delivery = Some(expected);
                resource.updated_at = Utc::now();
            } else if !changed {
                return Ok(resource);
            }

            let result = sqlx::query(
                r#"
                UPDATE resources SET status = ?, ordered_at = ?, expected_delivery = ?,
                    received_at = ?, updated_at = ?
                WHERE id = ? AND status = ?
                "#,
            )
            .bind(resource.status)
            .bind(resource.ordered_at)
            .bind(resource.expected_delivery)
            .bind(resource.received_at)
            .bind(resource.updated_at)
            .bind(resource.id)
            .bind(from)
            .execute(&self.pool)
            .await?;

            // Status moved underneath us; statuses only move forward so this settles
            if result.rows_affected() == 0 {
                tracing::debug!("Resource {} changed concurrently, re-checking {}", id, status);
                continue;
            }
            if changed {
                tracing::info!("🔄 Resource {} moved {} → {}", id, from, resource.status);
            }
            return Ok(resource);
        }
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("resource"));
        }
        Ok(())
    }

    /// Ordered resources across all projects whose delivery date has passed
    pub async fn overdue_deliveries(&self, today: NaiveDate) -> ServiceResult<Vec<Resource>> {
        Ok(sqlx::query_as::<_, Resource>(
            "SELECT * FROM resources WHERE status = ? AND expected_delivery < ? ORDER BY expected_delivery",
        )
        .bind(ResourceStatus::Ordered)
        .bind(today)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Persist the editable fields; lifecycle columns are owned by `set_status`
    async fn save(&self, resource: &Resource) -> ServiceResult<()> {
        sqlx::query(
            r#"
            UPDATE resources SET supplier_id = ?, name = ?, kind = ?, quantity = ?, unit = ?,
                unit_cost = ?, expected_delivery = ?, notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(resource.supplier_id)
        .bind(&resource.name)
        .bind(resource.kind)
        .bind(resource.quantity)
        .bind(&resource.unit)
        .bind(resource.unit_cost)
        .bind(resource.expected_delivery)
        .bind(&resource.notes)
        .bind(resource.updated_at)
        .bind(resource.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// The supplier must exist and belong to the project's owner
    async fn check_supplier(&self, project_id: Uuid, supplier_id: Uuid) -> ServiceResult<()> {
        let row: Option<(bool,)> = sqlx::query_as(
            r#"
            SELECT s.owner_id = p.owner_id
            FROM suppliers s, projects p
            WHERE s.id = ? AND p.id = ?
            "#,
        )
        .bind(supplier_id)
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((true,)) => Ok(()),
            Some((false,)) => Err(ServiceError::Forbidden("supplier")),
            None => Err(ServiceError::validation("supplier does not exist")),
        }
    }
}

fn validate_quantity(quantity: f64) -> ServiceResult<()> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(ServiceError::validation("quantity must be a positive number"));
    }
    Ok(())
}
