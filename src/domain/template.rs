/// Work item templates: reusable task blueprints
///
/// Templates without an owner are the built-in defaults shared by everyone;
/// user templates are private to their owner.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{double_option, task::CreateTask};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WorkItemTemplate {
    pub id: Uuid,
    /// `None` for built-in defaults
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub default_duration_days: Option<i64>,
    pub estimated_price: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkItemTemplate {
    pub fn is_visible_to(&self, user_id: Uuid) -> bool {
        self.owner_id.map_or(true, |owner| owner == user_id)
    }

    /// Task blueprint, with a due date when a start date and duration are known
    pub fn to_task(&self, milestone_id: Option<Uuid>, start_date: Option<NaiveDate>) -> CreateTask {
        let due_date = match (start_date, self.default_duration_days) {
            (Some(start), Some(days)) if days >= 0 => {
                start.checked_add_days(chrono::Days::new(days as u64))
            }
            _ => None,
        };

        CreateTask {
            description: self.description.clone(),
            milestone_id,
            due_date,
            estimated_price: self.estimated_price,
            template_id: Some(self.id),
            ..CreateTask::titled(self.name.clone())
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplate {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub default_duration_days: Option<i64>,
    pub estimated_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTemplate {
    pub name: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub default_duration_days: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub estimated_price: Option<Option<f64>>,
}

/// Built-in templates seeded on first start: (category, name, duration days)
pub const DEFAULT_TEMPLATES: &[(&str, &str, i64)] = &[
    ("preparation", "Site survey and measurements", 1),
    ("preparation", "Obtain building permits", 14),
    ("demolition", "Strip out and debris removal", 3),
    ("structural", "Wall removal and load-bearing support", 5),
    ("plumbing", "Rough-in plumbing", 4),
    ("electrical", "Rough-in electrical wiring", 4),
    ("insulation", "Insulation and vapour barrier", 2),
    ("drywall", "Drywall installation and taping", 5),
    ("flooring", "Floor preparation and installation", 4),
    ("tiling", "Wall and floor tiling", 4),
    ("painting", "Priming and painting", 3),
    ("kitchen", "Cabinet and worktop installation", 3),
    ("finishing", "Fixtures, trim and final connections", 2),
    ("finishing", "Final clean and snag list", 1),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn template(owner: Option<Uuid>, duration: Option<i64>) -> WorkItemTemplate {
        let now = Utc::now();
        WorkItemTemplate {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: "Priming and painting".into(),
            category: "painting".into(),
            description: Some("Two coats".into()),
            default_duration_days: duration,
            estimated_price: Some(800.0),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn defaults_are_visible_to_everyone() {
        let user = Uuid::new_v4();
        assert!(template(None, None).is_visible_to(user));
        assert!(template(Some(user), None).is_visible_to(user));
        assert!(!template(Some(Uuid::new_v4()), None).is_visible_to(user));
    }

    #[test]
    fn task_due_date_from_duration() {
        let start = NaiveDate::from_ymd_opt(2026, 4, 28).unwrap();
        let t = template(None, Some(3));
        let task = t.to_task(None, Some(start));
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2026, 5, 1));
        assert_eq!(task.estimated_price, Some(800.0));
        assert_eq!(task.template_id, Some(t.id));

        assert_eq!(template(None, None).to_task(None, Some(start)).due_date, None);
        assert_eq!(template(None, Some(3)).to_task(None, None).due_date, None);
    }
}
