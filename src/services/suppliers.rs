/// Supplier address book, private to each user

use chrono::Utc;
use sqlx::{sqlite::SqlitePool, QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::domain::{
    non_blank,
    supplier::{looks_like_email, CreateSupplier, SupplierFilter, UpdateSupplier},
    Supplier,
};
use crate::error::{ServiceError, ServiceResult};
use crate::services::{required_text, SearchTerm};

#[derive(Debug, Clone)]
pub struct SupplierService {
    pool: SqlitePool,
}

impl SupplierService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, owner_id: Uuid, input: CreateSupplier) -> ServiceResult<Supplier> {
        let now = Utc::now();
        let supplier = Supplier {
            id: Uuid::new_v4(),
            owner_id,
            name: required_text("name", &input.name)?,
            category: non_blank(input.category),
            contact_name: non_blank(input.contact_name),
            email: checked_email(input.email)?,
            phone: non_blank(input.phone),
            website: non_blank(input.website),
            notes: non_blank(input.notes),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO suppliers (id, owner_id, name, category, contact_name, email, phone,
                                   website, notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(supplier.id)
        .bind(supplier.owner_id)
        .bind(&supplier.name)
        .bind(&supplier.category)
        .bind(&supplier.contact_name)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.website)
        .bind(&supplier.notes)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Supplier> {
        sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("supplier"))
    }

    /// Load a supplier and check it belongs to `user_id`
    pub async fn get_owned(&self, id: Uuid, user_id: Uuid) -> ServiceResult<Supplier> {
        let supplier = self.get(id).await?;
        if supplier.owner_id != user_id {
            return Err(ServiceError::Forbidden("supplier"));
        }
        Ok(supplier)
    }

    pub async fn list(&self, owner_id: Uuid, filter: &SupplierFilter) -> ServiceResult<Vec<Supplier>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM suppliers WHERE owner_id = ");
        query.push_bind(owner_id);

        if let Some(category) = filter.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            query
                .push(" AND category = ")
                .push_bind(category.to_string())
                .push(" COLLATE NOCASE");
        }
        query.push(" ORDER BY name COLLATE NOCASE");

        let suppliers = query.build_query_as::<Supplier>().fetch_all(&self.pool).await?;
        Ok(match SearchTerm::parse(filter.search.as_deref()) {
            Some(term) => suppliers
                .into_iter()
                .filter(|s| term.matches([Some(s.name.as_str()), s.contact_name.as_deref(), s.notes.as_deref()]))
                .collect(),
            None => suppliers,
        })
    }

    pub async fn update(&self, id: Uuid, input: UpdateSupplier) -> ServiceResult<Supplier> {
        let mut supplier = self.get(id).await?;

        if let Some(name) = input.name {
            supplier.name = required_text("name", &name)?;
        }
        if let Some(category) = input.category {
            supplier.category = non_blank(category);
        }
        if let Some(contact_name) = input.contact_name {
            supplier.contact_name = non_blank(contact_name);
        }
        if let Some(email) = input.email {
            supplier.email = checked_email(email)?;
        }
        if let Some(phone) = input.phone {
            supplier.phone = non_blank(phone);
        }
        if let Some(website) = input.website {
            supplier.website = non_blank(website);
        }
        if let Some(notes) = input.notes {
            supplier.notes = non_blank(notes);
        }
        supplier.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE suppliers SET name = ?, category = ?, contact_name = ?, email = ?, phone = ?,
                website = ?, notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&supplier.name)
        .bind(&supplier.category)
        .bind(&supplier.contact_name)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.website)
        .bind(&supplier.notes)
        .bind(supplier.updated_at)
        .bind(supplier.id)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Delete a supplier; resources that referenced it keep existing unlinked
    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("supplier"));
        }
        Ok(())
    }
}

fn checked_email(email: Option<String>) -> ServiceResult<Option<String>> {
    match non_blank(email) {
        Some(email) if !looks_like_email(&email) => {
            Err(ServiceError::validation(format!("'{email}' is not a valid e-mail address")))
        }
        email => Ok(email),
    }
}
