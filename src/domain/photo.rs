/// Site photos with metadata pulled from EXIF

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Photo {
    pub id: Uuid,
    pub project_id: Uuid,
    pub uploaded_by: Uuid,
    pub file_name: String,
    pub caption: Option<String>,
    /// Room or area of the site, e.g. "kitchen"
    pub area: Option<String>,
    pub mime_type: String,
    pub size_bytes: i64,
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub taken_at: Option<NaiveDateTime>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub orientation: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metadata extracted from an image's EXIF block.
/// Every field is optional: images without EXIF produce the default value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    /// Capture time as recorded by the camera (local, no zone)
    pub taken_at: Option<NaiveDateTime>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub orientation: Option<u32>,
    /// Signed decimal degrees, south negative
    pub latitude: Option<f64>,
    /// Signed decimal degrees, west negative
    pub longitude: Option<f64>,
}

impl PhotoMetadata {
    pub fn is_empty(&self) -> bool {
        *self == PhotoMetadata::default()
    }
}

#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub file_name: String,
    pub caption: Option<String>,
    pub area: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePhoto {
    #[serde(default, deserialize_with = "crate::domain::double_option")]
    pub caption: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::domain::double_option")]
    pub area: Option<Option<String>>,
}
