/// Site photo uploads with EXIF extraction

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::domain::{
    non_blank,
    photo::{NewPhoto, UpdatePhoto},
    Photo,
};
use crate::error::{ServiceError, ServiceResult};
use crate::services::required_text;
use crate::storage::{detect_mime_type, exif, FileStore};

#[derive(Debug, Clone)]
pub struct PhotoService {
    pool: SqlitePool,
    files: FileStore,
}

impl PhotoService {
    pub fn new(pool: SqlitePool, files: FileStore) -> Self {
        Self { pool, files }
    }

    pub async fn upload(&self, project_id: Uuid, uploaded_by: Uuid, upload: NewPhoto) -> ServiceResult<Photo> {
        let file_name = required_text("file_name", &upload.file_name)?;
        if upload.bytes.is_empty() {
            return Err(ServiceError::validation("photo is empty"));
        }
        let mime_type = detect_mime_type(upload.content_type.as_deref(), &file_name);
        if !mime_type.starts_with("image/") {
            return Err(ServiceError::validation(format!("{mime_type} is not an image type")));
        }

        let metadata = exif::extract(&upload.bytes);
        if metadata.is_empty() {
            tracing::debug!("No EXIF metadata in {}", file_name);
        }
        let storage_key = self.files.put(project_id, &file_name, &upload.bytes).await?;

        let now = Utc::now();
        let photo = Photo {
            id: Uuid::new_v4(),
            project_id,
            uploaded_by,
            file_name,
            caption: non_blank(upload.caption),
            area: non_blank(upload.area),
            mime_type,
            size_bytes: upload.bytes.len() as i64,
            storage_key,
            taken_at: metadata.taken_at,
            camera_make: metadata.camera_make,
            camera_model: metadata.camera_model,
            width: metadata.width.map(i64::from),
            height: metadata.height.map(i64::from),
            orientation: metadata.orientation.map(i64::from),
            latitude: metadata.latitude,
            longitude: metadata.longitude,
            created_at: now,
            updated_at: now,
        };

        let inserted = sqlx::query(
            r#"
            INSERT INTO photos (id, project_id, uploaded_by, file_name, caption, area, mime_type,
                                size_bytes, storage_key, taken_at, camera_make, camera_model,
                                width, height, orientation, latitude, longitude,
                                created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(photo.id)
        .bind(photo.project_id)
        .bind(photo.uploaded_by)
        .bind(&photo.file_name)
        .bind(&photo.caption)
        .bind(&photo.area)
        .bind(&photo.mime_type)
        .bind(photo.size_bytes)
        .bind(&photo.storage_key)
        .bind(photo.taken_at)
        .bind(&photo.camera_make)
        .bind(&photo.camera_model)
        .bind(photo.width)
        .bind(photo.height)
        .bind(photo.orientation)
        .bind(photo.latitude)
        .bind(photo.longitude)
        .bind(photo.created_at)
        .bind(photo.updated_at)
        .execute(&self.pool)
        .await;

        if let Err(e) = inserted {
            if let Err(cleanup) = self.files.delete(&photo.storage_key).await {
                tracing::warn!("⚠️ Failed to remove orphaned file {}: {}", photo.storage_key, cleanup);
            }
            return Err(e.into());
        }

        tracing::info!("📷 Uploaded photo '{}' to project {}", photo.file_name, project_id);
        Ok(photo)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Photo> {
        sqlx::query_as::<_, Photo>("SELECT * FROM photos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ServiceError::NotFound("photo"))
    }

    /// Photos in capture order; photos without a capture time come last
    pub async fn list(&self, project_id: Uuid) -> ServiceResult<Vec<Photo>> {
        Ok(sqlx::query_as::<_, Photo>(
            "SELECT * FROM photos WHERE project_id = ? ORDER BY taken_at IS NULL, taken_at, created_at",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn update(&self, id: Uuid, input: UpdatePhoto) -> ServiceResult<Photo> {
        let mut photo = self.get(id).await?;
        if let Some(caption) = input.caption {
            photo.caption = non_blank(caption);
        }
        if let Some(area) = input.area {
            photo.area = non_blank(area);
        }
        photo.updated_at = Utc::now();

        sqlx::query("UPDATE photos SET caption = ?, area = ?, updated_at = ? WHERE id = ?")
            .bind(&photo.caption)
            .bind(&photo.area)
            .bind(photo.updated_at)
            .bind(photo.id)
            .execute(&self.pool)
            .await?;

        Ok(photo)
    }

    pub async fn read_content(&self, photo: &Photo) -> ServiceResult<Vec<u8>> {
        self.files.get(&photo.storage_key).await
    }

    pub async fn delete(&self, id: Uuid) -> ServiceResult<()> {
        let photo = self.get(id).await?;
        sqlx::query("DELETE FROM photos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.files.delete(&photo.storage_key).await
    }
}
