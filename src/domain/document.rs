/// Project documents (contracts, invoices, permits, plans)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    sqlx::Type,
    strum::Display,
    strum::EnumString,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentKind {
    Contract,
    Invoice,
    Permit,
    Plan,
    Quote,
    #[default]
    Other,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub project_id: Uuid,
    pub uploaded_by: Uuid,
    pub name: String,
    pub kind: DocumentKind,
    pub mime_type: String,
    pub size_bytes: i64,
    /// Key of the blob in the file store
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upload request after the multipart body has been read
#[derive(Debug, Clone)]
pub struct NewDocument {
    /// Display name
    pub name: String,
    /// Name of the uploaded file; drives MIME detection and the blob key
    pub file_name: String,
    pub kind: DocumentKind,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}
