/// Milestones: dated checkpoints of a project
///
/// Lifecycle (no cycles, `completed` is terminal):
///
/// ```text
/// not_started ──► in_progress ──► completed
///      │               │              ▲
///      └──────┬────────┘              │
///             ▼                       │
///          overdue ───────────────────┘
/// ```
///
/// `not_started` may also go straight to `completed`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::double_option;
use crate::error::{ServiceError, ServiceResult};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
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
pub enum MilestoneStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Overdue,
}

impl MilestoneStatus {
    /// Whether the lifecycle allows moving from `self` to `next`
    pub fn can_transition_to(self, next: MilestoneStatus) -> bool {
        use MilestoneStatus::*;
        matches!(
            (self, next),
            (NotStarted, InProgress)
                | (NotStarted, Completed)
                | (NotStarted, Overdue)
                | (InProgress, Completed)
                | (InProgress, Overdue)
                | (Overdue, Completed)
        )
    }

    /// Statuses that still count as open work
    pub fn is_open(self) -> bool {
        matches!(self, MilestoneStatus::NotStarted | MilestoneStatus::InProgress)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Milestone {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub status: MilestoneStatus,
    pub completed_at: Option<DateTime<Utc>>,
    /// Display order within the project
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Milestone {
    /// Open milestone whose due date has passed
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status.is_open() && self.due_date < today
    }

    /// Apply a status change, stamping `completed_at` when completing.
    ///
    /// Same-state changes are accepted and leave the milestone untouched.
    pub fn apply_status(&mut self, next: MilestoneStatus, now: DateTime<Utc>) -> ServiceResult<bool> {
        if self.status == next {
            return Ok(false);
        }
        if !self.status.can_transition_to(next) {
            return Err(ServiceError::transition(self.status, next));
        }
        self.status = next;
        if next == MilestoneStatus::Completed {
            self.completed_at = Some(now);
        }
        self.updated_at = now;
        Ok(true)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMilestone {
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMilestone {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub due_date: Option<NaiveDate>,
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MilestoneStatusChange {
    pub status: MilestoneStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use MilestoneStatus::*;

    fn milestone(status: MilestoneStatus, due: NaiveDate) -> Milestone {
        let now = Utc::now();
        Milestone {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            title: "Demolition".into(),
            description: None,
            due_date: due,
            status,
            completed_at: None,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn allowed_transitions() {
        assert!(NotStarted.can_transition_to(InProgress));
        assert!(NotStarted.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Overdue));
        assert!(Overdue.can_transition_to(Completed));
    }

    #[test]
    fn lifecycle_has_no_cycles() {
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(NotStarted));
        assert!(!InProgress.can_transition_to(NotStarted));
        assert!(!Overdue.can_transition_to(InProgress));
        assert!(!Overdue.can_transition_to(NotStarted));
    }

    #[test]
    fn overdue_only_for_open_milestones_past_due() {
        assert!(milestone(NotStarted, day(10)).is_overdue(day(11)));
        assert!(milestone(InProgress, day(10)).is_overdue(day(11)));
        // due today is not overdue yet
        assert!(!milestone(InProgress, day(10)).is_overdue(day(10)));
        assert!(!milestone(Completed, day(10)).is_overdue(day(11)));
        assert!(!milestone(Overdue, day(10)).is_overdue(day(11)));
    }

    #[test]
    fn completing_stamps_completed_at() {
        let mut m = milestone(InProgress, day(10));
        let now = Utc::now();
        assert!(m.apply_status(Completed, now).unwrap());
        assert_eq!(m.completed_at, Some(now));
        assert!(m.apply_status(InProgress, now).is_err());
    }

    #[test]
    fn same_status_is_a_noop() {
        let mut m = milestone(InProgress, day(10));
        assert!(!m.apply_status(InProgress, Utc::now()).unwrap());
    }
}
