/// Procurement of materials, equipment and subcontractors
///
/// Lifecycle: needed → ordered → received, with cancellation allowed until
/// the resource is received. `received` and `cancelled` are terminal.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{double_option, round_cents};
use crate::error::{ServiceError, ServiceResult};

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
pub enum ResourceKind {
    #[default]
    Material,
    Equipment,
    Subcontractor,
}

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
pub enum ResourceStatus {
    #[default]
    Needed,
    Ordered,
    Received,
    Cancelled,
}

impl ResourceStatus {
    pub fn can_transition_to(self, next: ResourceStatus) -> bool {
        use ResourceStatus::*;
        matches!(
            (self, next),
            (Needed, Ordered) | (Needed, Cancelled) | (Ordered, Received) | (Ordered, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ResourceStatus::Received | ResourceStatus::Cancelled)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub project_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub name: String,
    pub kind: ResourceKind,
    pub quantity: f64,
    /// Unit of measure, e.g. "m2" or "bags"
    pub unit: Option<String>,
    pub unit_cost: Option<f64>,
    pub status: ResourceStatus,
    pub ordered_at: Option<DateTime<Utc>>,
    pub expected_delivery: Option<NaiveDate>,
    pub received_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Ordered and the expected delivery date has passed
    pub fn is_delivery_overdue(&self, today: NaiveDate) -> bool {
        self.status == ResourceStatus::Ordered
            && self.expected_delivery.is_some_and(|expected| expected < today)
    }

    pub fn total_cost(&self) -> Option<f64> {
        self.unit_cost.map(|cost| round_cents(cost * self.quantity))
    }

    /// Apply a lifecycle change, stamping order/receipt times.
    /// Returns false when the resource already has that status.
    pub fn apply_status(&mut self, next: ResourceStatus, now: DateTime<Utc>) -> ServiceResult<bool> {
        if self.status == next {
            return Ok(false);
        }
        if !self.status.can_transition_to(next) {
            return Err(ServiceError::transition(self.status, next));
        }
        match next {
            ResourceStatus::Ordered => self.ordered_at = Some(now),
            ResourceStatus::Received => self.received_at = Some(now),
            _ => {}
        }
        self.status = next;
        self.updated_at = now;
        Ok(true)
    }
}

/// Resource with derived procurement fields, as served by the API
#[derive(Debug, Clone, Serialize)]
pub struct ResourceView {
    #[serde(flatten)]
    pub resource: Resource,
    pub total_cost: Option<f64>,
    pub delivery_overdue: bool,
}

impl ResourceView {
    pub fn new(resource: Resource, today: NaiveDate) -> Self {
        Self {
            total_cost: resource.total_cost(),
            delivery_overdue: resource.is_delivery_overdue(today),
            resource,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateResource {
    pub name: String,
    pub kind: Option<ResourceKind>,
    pub supplier_id: Option<Uuid>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub unit_cost: Option<f64>,
    pub expected_delivery: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl CreateResource {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            supplier_id: None,
            quantity: None,
            unit: None,
            unit_cost: None,
            expected_delivery: None,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateResource {
    pub name: Option<String>,
    pub kind: Option<ResourceKind>,
    #[serde(default, deserialize_with = "double_option")]
    pub supplier_id: Option<Option<Uuid>>,
    pub quantity: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    pub unit: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub unit_cost: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub expected_delivery: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceStatusChange {
    pub status: ResourceStatus,
    /// Optionally set the expected delivery date when ordering
    pub expected_delivery: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceFilter {
    pub status: Option<ResourceStatus>,
    /// Only ordered resources whose delivery date has passed
    #[serde(default)]
    pub overdue: bool,
}
