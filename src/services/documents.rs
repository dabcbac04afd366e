/// Project documents: metadata in SQLite, bytes in the file store

use chrono::Utc;
use sqlx::{sqlite::SqlitePool, QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::domain::{document::NewDocument, Document, DocumentKind};
use crate::error::{ServiceError, ServiceResult};
use crate::services::required_text;
use crate::storage::{detect_mime_type, FileStore};

#[derive(Debug, Clone)]
pub struct DocumentService {
    pool: SqlitePool,
    files: FileStore,
}

impl DocumentService {
    pub fn new(pool: SqlitePool, files: FileStore) -> Self {
        Self { pool, files }
    }

    pub async fn upload(
        &self,
        project_id: Uuid,
        uploaded_by: Uuid,
        upload: NewDocument,
    ) -> ServiceResult<Document> {
        let name = required_text("name", &upload.name)?;
        if upload.bytes.is_empty() {
            return Err(ServiceError::validation("document is empty"));
        }

        let file_name = match upload.file_name.trim() {
            "" => name.as_str(),
            trimmed => trimmed,
        };
        let mime_type = detect_mime_type(upload.content_type.as_deref(), file_name);
        let storage_key = self.files.put(project_id, file_name, &upload.bytes).await?;

        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            project_id,
            uploaded_by,
            name,
            kind: upload.kind,
            mime_type,
            size_bytes: upload.bytes.len() as i64,
            storage_key,
            created_at: now,
            updated_at: now,
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO documents (id, project_id, uploaded_by, name, kind, mime_type,
                                   size_bytes, storage_key, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(document.id)
        .bind(document.project_id)
        .bind(document.uploaded_by)
        .bind(&document.name)
        .bind(document.kind)
        .bind(&document.mime_type)
        .bind(document.size_bytes)
        .bind(&document.storage_key)
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&self.pool)
        .await;

        if let Err(e) = inserted {
            if let Err(cleanup) = self.files.delete(&document.storage_key).await {
                tracing::warn!("⚠️ Failed to remove orphaned file {}: {}", document.storage_key, cleanup);
            }
            return Err(e.into());
        }

        tracing::info!(
            "📄 Uploaded {} '{}' ({} bytes) to project {}",
            document.kind,
            document.name,
            document.size_bytes,
            project_id
        );
        Ok(document)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Document> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("document"))
    }

    pub async fn list(&self, project_id: Uuid, kind: Option<DocumentKind>) -> ServiceResult<Vec<Document>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM documents WHERE project_id = ");
        query.push_bind(project_id);
        if let Some(kind) = kind {
            query.push(" AND kind = ").push_bind(kind);
        }
        query.push(" ORDER BY created_at DESC");

        Ok(query.build_query_as::<Document>().fetch_all(&self.pool).await?)
    }

    /// Stored bytes of a document
    pub async fn read_content(&self, document: &Document) -> ServiceResult<Vec<u8>> {
        self.files.get(&document.storage_key).await
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let document = self.get(id).await?;
        sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.files.delete(&document.storage_key).await
    }
}
