/// Work item templates: storage plus a lock-free in-memory catalog
///
/// Templates are read on every "create tasks from templates" request and
/// change rarely, so reads go through `TemplateCatalog`, an `ArcSwap`
/// snapshot that is swapped whole whenever a template is written.

use arc_swap::ArcSwap;
use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

use crate::domain::{
    non_blank,
    template::{CreateTemplate, UpdateTemplate, DEFAULT_TEMPLATES},
    validate_amount, WorkItemTemplate,
};
use crate::error::{ServiceError, ServiceResult};
use crate::services::required_text;

#[derive(Debug, Clone)]
pub struct TemplateService {
    pool: SqlitePool,
}

impl TemplateService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the built-in templates unless defaults already exist.
    /// Returns the number of templates inserted.
    pub async fn seed_defaults(&self) -> ServiceResult<usize> {
        let (existing,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM work_item_templates WHERE owner_id IS NULL")
                .fetch_one(&self.pool)
                .await?;
        if existing > 0 {
            return Ok(0);
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        for (category, name, days) in DEFAULT_TEMPLATES {
            sqlx::query(
                r#"
                INSERT INTO work_item_templates (id, owner_id, name, category, description,
                                                 default_duration_days, estimated_price,
                                                 created_at, updated_at)
                VALUES (?, NULL, ?, ?, NULL, ?, NULL, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(*name)
            .bind(*category)
            .bind(*days)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!("🌱 Seeded {} default work item templates", DEFAULT_TEMPLATES.len());
        Ok(DEFAULT_TEMPLATES.len())
    }

    pub async fn create(&self, owner_id: Uuid, input: CreateTemplate) -> ServiceResult<WorkItemTemplate> {
        validate_duration(input.default_duration_days)?;
        if let Some(price) = input.estimated_price {
            validate_amount("estimated_price", price)?;
        }

        let now = Utc::now();
        let template = WorkItemTemplate {
            id: Uuid::new_v4(),
            owner_id: Some(owner_id),
            name: required_text("name", &input.name)?,
            category: required_text("category", &input.category)?,
            description: non_blank(input.description),
            default_duration_days: input.default_duration_days,
            estimated_price: input.estimated_price,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO work_item_templates (id, owner_id, name, category, description,
                                             default_duration_days, estimated_price,
                                             created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(template.id)
        .bind(template.owner_id)
        .bind(&template.name)
        .bind(&template.category)
        .bind(&template.description)
        .bind(template.default_duration_days)
        .bind(template.estimated_price)
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(template)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<WorkItemTemplate> {
        sqlx::query_as::<_, WorkItemTemplate>("SELECT * FROM work_item_templates WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("template"))
    }

    pub async fn load_all(&self) -> ServiceResult<Vec<WorkItemTemplate>> {
        Ok(
            sqlx::query_as::<_, WorkItemTemplate>("SELECT * FROM work_item_templates")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Update a template owned by `user_id`; defaults are read-only
    pub async fn update(&self, id: Uuid, user_id: Uuid, input: UpdateTemplate) -> ServiceResult<WorkItemTemplate> {
        let mut template = self.get_writable(id, user_id).await?;

        if let Some(name) = input.name {
            template.name = required_text("name", &name)?;
        }
        if let Some(category) = input.category {
            template.category = required_text("category", &category)?;
        }
        if let Some(description) = input.description {
            template.description = non_blank(description);
        }
        if let Some(days) = input.default_duration_days {
            validate_duration(days)?;
            template.default_duration_days = days;
        }
        if let Some(price) = input.estimated_price {
            if let Some(price) = price {
                validate_amount("estimated_price", price)?;
            }
            template.estimated_price = price;
        }
        template.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE work_item_templates SET name = ?, category = ?, description = ?,
                default_duration_days = ?, estimated_price = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&template.name)
        .bind(&template.category)
        .bind(&template.description)
        .bind(template.default_duration_days)
        .bind(template.estimated_price)
        .bind(template.updated_at)
        .bind(template.id)
        .execute(&self.pool)
        .await?;

        Ok(template)
    }

    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> ServiceResult<()> {
        self.get_writable(id, user_id).await?;
        sqlx::query("DELETE FROM work_item_templates WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_writable(&self, id: Uuid, user_id: Uuid) -> ServiceResult<WorkItemTemplate> {
        let template = self.get(id).await?;
        match template.owner_id {
            Some(owner) if owner == user_id => Ok(template),
            _ => Err(ServiceError::Forbidden("template")),
        }
    }
}

fn validate_duration(days: Option<i64>) -> ServiceResult<()> {
    match days {
        Some(days) if days < 0 => Err(ServiceError::validation(
            "default_duration_days must not be negative",
        )),
        _ => Ok(()),
    }
}

/// In-memory template snapshot, swapped atomically on every change
#[derive(Debug)]
pub struct TemplateCatalog {
    templates: ArcSwap<HashMap<Uuid, WorkItemTemplate>>,
    storage: TemplateService,
}

impl TemplateCatalog {
    pub fn new(storage: TemplateService) -> Self {
        Self {
            templates: ArcSwap::new(Arc::new(HashMap::new())),
            storage,
        }
    }

    /// Load every template from the database into the snapshot
    pub async fn init_from_storage(&self) -> ServiceResult<()> {
        let templates = self.storage.load_all().await?;
        let map: HashMap<_, _> = templates.into_iter().map(|t| (t.id, t)).collect();
        self.templates.store(Arc::new(map));

        tracing::info!("Loaded template catalog with {} templates", self.templates.load().len());
        Ok(())
    }

    /// Refresh one template from storage, dropping it if it no longer exists
    pub async fn reload_template(&self, id: Uuid) -> ServiceResult<()> {
        let fresh = match self.storage.get(id).await {
            Ok(template) => Some(template),
            Err(ServiceError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        self.templates.rcu(|current| {
            let mut next = HashMap::clone(current);
            match &fresh {
                Some(template) => next.insert(id, template.clone()),
                None => next.remove(&id),
            };
            next
        });
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Option<WorkItemTemplate> {
        self.templates.load().get(&id).cloned()
    }

    /// Defaults plus the user's own templates, sorted by category then name
    pub fn visible_to(&self, user_id: Uuid) -> Vec<WorkItemTemplate> {
        let mut visible: Vec<_> = self
            .templates
            .load()
            .values()
            .filter(|t| t.is_visible_to(user_id))
            .cloned()
            .collect();
        visible.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        visible
    }

    /// Resolve template ids for a user, in request order
    pub fn resolve(&self, ids: &[Uuid], user_id: Uuid) -> ServiceResult<Vec<WorkItemTemplate>> {
        let snapshot = self.templates.load();
        ids.iter()
            .map(|id| match snapshot.get(id) {
                Some(t) if t.is_visible_to(user_id) => Ok(t.clone()),
                Some(_) => Err(ServiceError::Forbidden("template")),
                None => Err(ServiceError::NotFound("template")),
            })
            .collect()
    }
}
