/// Blob storage for uploaded documents and photos
///
/// Files live under {data_dir}/uploads/{project_id}/{uuid}-{sanitized_name}.
/// The database keeps only the storage key.

pub mod exif;

use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

/// Local-disk blob store
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store bytes for a project file and return the new storage key
    pub async fn put(&self, project_id: Uuid, file_name: &str, bytes: &[u8]) -> ServiceResult<String> {
        let key = format!("{}/{}-{}", project_id, Uuid::new_v4(), sanitize_file_name(file_name));
        let path = self.resolve(&key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!("💾 Stored {} bytes at {}", bytes.len(), key);
        Ok(key)
    }

    pub async fn get(&self, key: &str) -> ServiceResult<Vec<u8>> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ServiceError::NotFound("file")),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a stored file; a file that is already gone is not an error
    pub async fn delete(&self, key: &str) -> ServiceResult<()> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("⚠️ Stored file already missing: {}", key);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove every file of a project (used when the project is deleted)
    pub async fn delete_project(&self, project_id: Uuid) -> ServiceResult<()> {
        let dir = self.root.join(project_id.to_string());
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Map a key to a path below the root, refusing traversal
    fn resolve(&self, key: &str) -> ServiceResult<PathBuf> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if key.is_empty() || !safe {
            return Err(ServiceError::validation(format!("invalid storage key: {key}")));
        }
        Ok(self.root.join(relative))
    }
}

/// Keep file names portable: ASCII alphanumerics, dot, dash and underscore
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.chars().take(120).collect()
    }
}

/// MIME type from the client-declared type, falling back to the file extension
pub fn detect_mime_type(declared: Option<&str>, file_name: &str) -> String {
    match declared.map(str::trim) {
        Some(declared) if !declared.is_empty() && declared != "application/octet-stream" => {
            declared.to_string()
        }
        _ => mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}
