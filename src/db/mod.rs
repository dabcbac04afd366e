/// SQLite database bootstrap
///
/// Opens (or creates) the single application database and makes sure every
/// table exists. Schema creation is idempotent so it runs on every startup.
///
/// Layout: {data_dir}/renovo.db

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;

/// Shared handle to the application database
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the database file, creating parent directories and the file when missing
    pub async fn connect(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!("Failed to create database directory '{}': {}", parent.display(), e)
            })?;
        }

        tracing::info!("🗄️ Opening database: {}", db_path.display());

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        let database = Self { pool };
        database.init_schema().await?;

        tracing::info!("✅ Database ready: {}", db_path.display());

        Ok(database)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create all tables and indexes
    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

/// Table definitions in dependency order.
/// UUID columns hold 16-byte blobs, dates are ISO-8601 text.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BLOB PRIMARY KEY,
        external_id TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL,
        name TEXT NOT NULL,
        avatar_url TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id BLOB PRIMARY KEY,
        token TEXT NOT NULL UNIQUE,
        user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        expires_at TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id BLOB PRIMARY KEY,
        owner_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        description TEXT,
        address TEXT,
        status TEXT NOT NULL,
        start_date TEXT,
        target_end_date TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS milestones (
        id BLOB PRIMARY KEY,
        project_id BLOB NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT,
        due_date TEXT NOT NULL,
        status TEXT NOT NULL,
        completed_at TEXT,
        position INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS work_item_templates (
        id BLOB PRIMARY KEY,
        owner_id BLOB REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        category TEXT NOT NULL,
        description TEXT,
        default_duration_days INTEGER,
        estimated_price REAL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id BLOB PRIMARY KEY,
        project_id BLOB NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        milestone_id BLOB REFERENCES milestones(id) ON DELETE SET NULL,
        assignee_id BLOB REFERENCES users(id) ON DELETE SET NULL,
        template_id BLOB REFERENCES work_item_templates(id) ON DELETE SET NULL,
        title TEXT NOT NULL,
        description TEXT,
        status TEXT NOT NULL,
        priority TEXT NOT NULL,
        due_date TEXT,
        estimated_price REAL,
        actual_price REAL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS budgets (
        id BLOB PRIMARY KEY,
        project_id BLOB NOT NULL UNIQUE REFERENCES projects(id) ON DELETE CASCADE,
        currency TEXT NOT NULL,
        total_estimated REAL NOT NULL DEFAULT 0,
        total_actual REAL NOT NULL DEFAULT 0,
        items_estimated REAL NOT NULL DEFAULT 0,
        items_actual REAL NOT NULL DEFAULT 0,
        tasks_estimated REAL NOT NULL DEFAULT 0,
        tasks_actual REAL NOT NULL DEFAULT 0,
        recalculated_at TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS budget_items (
        id BLOB PRIMARY KEY,
        budget_id BLOB NOT NULL REFERENCES budgets(id) ON DELETE CASCADE,
        category TEXT NOT NULL,
        description TEXT NOT NULL,
        estimated_cost REAL NOT NULL DEFAULT 0,
        actual_cost REAL NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        id BLOB PRIMARY KEY,
        project_id BLOB NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        uploaded_by BLOB NOT NULL REFERENCES users(id),
        name TEXT NOT NULL,
        kind TEXT NOT NULL,
        mime_type TEXT NOT NULL,
        size_bytes INTEGER NOT NULL,
        storage_key TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS photos (
        id BLOB PRIMARY KEY,
        project_id BLOB NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        uploaded_by BLOB NOT NULL REFERENCES users(id),
        file_name TEXT NOT NULL,
        caption TEXT,
        area TEXT,
        mime_type TEXT NOT NULL,
        size_bytes INTEGER NOT NULL,
        storage_key TEXT NOT NULL,
        taken_at TEXT,
        camera_make TEXT,
        camera_model TEXT,
        width INTEGER,
        height INTEGER,
        orientation INTEGER,
        latitude REAL,
        longitude REAL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS suppliers (
        id BLOB PRIMARY KEY,
        owner_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        category TEXT,
        contact_name TEXT,
        email TEXT,
        phone TEXT,
        website TEXT,
        notes TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS resources (
        id BLOB PRIMARY KEY,
        project_id BLOB NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        supplier_id BLOB REFERENCES suppliers(id) ON DELETE SET NULL,
        name TEXT NOT NULL,
        kind TEXT NOT NULL,
        quantity REAL NOT NULL DEFAULT 1,
        unit TEXT,
        unit_cost REAL,
        status TEXT NOT NULL,
        ordered_at TEXT,
        expected_delivery TEXT,
        received_at TEXT,
        notes TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_projects_owner ON projects(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_milestones_project ON milestones(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_milestone ON tasks(milestone_id)",
    "CREATE INDEX IF NOT EXISTS idx_budget_items_budget ON budget_items(budget_id)",
    "CREATE INDEX IF NOT EXISTS idx_documents_project ON documents(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_photos_project ON photos(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_resources_project ON resources(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_suppliers_owner ON suppliers(owner_id)",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("renovo.db");

        let first = Database::connect(&path).await.unwrap();
        first.init_schema().await.unwrap();

        let tables: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .fetch_all(first.pool())
                .await
                .unwrap();
        let names: Vec<&str> = tables.iter().map(|(name,)| name.as_str()).collect();
        for expected in ["budgets", "budget_items", "milestones", "projects", "resources", "tasks"] {
            assert!(names.contains(&expected), "missing table {expected}");
        }
    }
}
