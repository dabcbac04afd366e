/// Project entity and request payloads

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::double_option;

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
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    OnHold,
    Completed,
    Cancelled,
}

/// A renovation project owned by one user
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Site address of the renovation
    pub address: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub target_end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<NaiveDate>,
    pub target_end_date: Option<NaiveDate>,
    /// Budget currency code, defaults to EUR
    pub currency: Option<String>,
}

impl CreateProject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            address: None,
            status: None,
            start_date: None,
            target_end_date: None,
            currency: None,
        }
    }
}

/// Partial update; `null` clears optional fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub target_end_date: Option<Option<NaiveDate>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    /// Case-insensitive substring over name, description and address
    pub search: Option<String>,
}

/// Reject a schedule whose target end precedes its start
pub fn validate_schedule(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> crate::error::ServiceResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(crate::error::ServiceError::validation(
                "target_end_date must not be before start_date",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_text_round_trips_through_strum() {
        assert_eq!(ProjectStatus::OnHold.to_string(), "on_hold");
        assert_eq!(ProjectStatus::from_str("on_hold").unwrap(), ProjectStatus::OnHold);
    }

    #[test]
    fn schedule_validation() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1);
        let end = NaiveDate::from_ymd_opt(2026, 2, 1);
        assert!(validate_schedule(start, end).is_err());
        assert!(validate_schedule(end, start).is_ok());
        assert!(validate_schedule(None, end).is_ok());
    }
}
