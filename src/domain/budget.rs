/// Budget aggregation and variance alerting
///
/// A project budget is never edited directly: its totals are derived from the
/// budget's line items plus the priced tasks of the project and stored again
/// after every change to either.
///
///   items_*  = Σ estimated_cost / actual_cost over budget items
///   tasks_*  = Σ estimated_price / actual_price over priced, non-cancelled tasks
///   total_*  = items_* + tasks_*
///   variance = (total_actual - total_estimated) / total_estimated * 100

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{round_cents, Task, TaskStatus};

/// Variance above this percentage raises a warning
pub const WARNING_THRESHOLD_PERCENT: f64 = 10.0;
/// Variance above this percentage is critical
pub const CRITICAL_THRESHOLD_PERCENT: f64 = 20.0;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub project_id: Uuid,
    pub currency: String,
    pub total_estimated: f64,
    pub total_actual: f64,
    pub items_estimated: f64,
    pub items_actual: f64,
    pub tasks_estimated: f64,
    pub tasks_actual: f64,
    pub recalculated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn totals(&self) -> BudgetTotals {
        BudgetTotals {
            items_estimated: self.items_estimated,
            items_actual: self.items_actual,
            tasks_estimated: self.tasks_estimated,
            tasks_actual: self.tasks_actual,
            total_estimated: self.total_estimated,
            total_actual: self.total_actual,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BudgetItem {
    pub id: Uuid,
    pub budget_id: Uuid,
    /// Free-form grouping such as "plumbing" or "permits"
    pub category: String,
    pub description: String,
    pub estimated_cost: f64,
    pub actual_cost: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBudgetItem {
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub estimated_cost: f64,
    #[serde(default)]
    pub actual_cost: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBudgetItem {
    pub category: Option<String>,
    pub description: Option<String>,
    pub estimated_cost: Option<f64>,
    pub actual_cost: Option<f64>,
}

/// Derived budget totals split by source
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetTotals {
    pub items_estimated: f64,
    pub items_actual: f64,
    pub tasks_estimated: f64,
    pub tasks_actual: f64,
    pub total_estimated: f64,
    pub total_actual: f64,
}

impl BudgetTotals {
    /// Sum line items and priced tasks into fresh totals
    pub fn compute<'a>(
        items: impl IntoIterator<Item = &'a BudgetItem>,
        tasks: impl IntoIterator<Item = &'a Task>,
    ) -> Self {
        let (items_estimated, items_actual) = items
            .into_iter()
            .fold((0.0, 0.0), |(est, act), item| {
                (est + item.estimated_cost, act + item.actual_cost)
            });

        let (tasks_estimated, tasks_actual) = tasks
            .into_iter()
            .filter(|task| task.is_priced() && task.status != TaskStatus::Cancelled)
            .fold((0.0, 0.0), |(est, act), task| {
                (
                    est + task.estimated_price.unwrap_or(0.0),
                    act + task.actual_price.unwrap_or(0.0),
                )
            });

        Self::from_parts(items_estimated, items_actual, tasks_estimated, tasks_actual)
    }

    /// Build totals from per-source sums, rounding everything to cents
    pub fn from_parts(
        items_estimated: f64,
        items_actual: f64,
        tasks_estimated: f64,
        tasks_actual: f64,
    ) -> Self {
        let items_estimated = round_cents(items_estimated);
        let items_actual = round_cents(items_actual);
        let tasks_estimated = round_cents(tasks_estimated);
        let tasks_actual = round_cents(tasks_actual);
        Self {
            items_estimated,
            items_actual,
            tasks_estimated,
            tasks_actual,
            total_estimated: round_cents(items_estimated + tasks_estimated),
            total_actual: round_cents(items_actual + tasks_actual),
        }
    }

    pub fn variance_percent(&self) -> Option<f64> {
        variance_percent(self.total_estimated, self.total_actual)
    }

    pub fn alert(&self) -> BudgetAlert {
        BudgetAlert::classify(self.variance_percent())
    }
}

/// `(actual - estimated) / estimated * 100`, undefined without an estimate
pub fn variance_percent(estimated: f64, actual: f64) -> Option<f64> {
    if estimated <= 0.0 || !estimated.is_finite() || !actual.is_finite() {
        return None;
    }
    Some((actual - estimated) / estimated * 100.0)
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BudgetAlert {
    #[default]
    None,
    Warning,
    Critical,
}

impl BudgetAlert {
    pub fn classify(variance: Option<f64>) -> Self {
        match variance {
            Some(v) if v > CRITICAL_THRESHOLD_PERCENT => BudgetAlert::Critical,
            Some(v) if v > WARNING_THRESHOLD_PERCENT => BudgetAlert::Warning,
            _ => BudgetAlert::None,
        }
    }
}

/// Budget as returned by the API: stored totals plus variance classification
#[derive(Debug, Clone, Serialize)]
pub struct BudgetView {
    #[serde(flatten)]
    pub budget: Budget,
    pub variance_percent: Option<f64>,
    pub alert: BudgetAlert,
    pub remaining: f64,
}

impl From<Budget> for BudgetView {
    fn from(budget: Budget) -> Self {
        let totals = budget.totals();
        Self {
            variance_percent: totals.variance_percent().map(|v| (v * 100.0).round() / 100.0),
            alert: totals.alert(),
            remaining: round_cents(totals.total_estimated - totals.total_actual),
            budget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskPriority;

    fn item(estimated: f64, actual: f64) -> BudgetItem {
        let now = Utc::now();
        BudgetItem {
            id: Uuid::new_v4(),
            budget_id: Uuid::nil(),
            category: "materials".into(),
            description: "tiles".into(),
            estimated_cost: estimated,
            actual_cost: actual,
            created_at: now,
            updated_at: now,
        }
    }

    fn task(estimated: Option<f64>, actual: Option<f64>, status: TaskStatus) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            project_id: Uuid::nil(),
            milestone_id: None,
            assignee_id: None,
            template_id: None,
            title: "paint".into(),
            description: None,
            status,
            priority: TaskPriority::Medium,
            due_date: None,
            estimated_price: estimated,
            actual_price: actual,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn sums_items_and_priced_tasks_by_source() {
        let items = vec![item(1000.0, 900.0), item(250.5, 300.25)];
        let tasks = vec![
            task(Some(400.0), Some(450.0), TaskStatus::Done),
            task(None, Some(80.0), TaskStatus::InProgress),
            task(None, None, TaskStatus::Todo),
        ];

        let totals = BudgetTotals::compute(&items, &tasks);

        assert_eq!(totals.items_estimated, 1250.5);
        assert_eq!(totals.items_actual, 1200.25);
        assert_eq!(totals.tasks_estimated, 400.0);
        assert_eq!(totals.tasks_actual, 530.0);
        assert_eq!(totals.total_estimated, 1650.5);
        assert_eq!(totals.total_actual, 1730.25);
    }

    #[test]
    fn cancelled_tasks_do_not_count() {
        let tasks = vec![task(Some(100.0), Some(100.0), TaskStatus::Cancelled)];
        let no_items: Vec<BudgetItem> = Vec::new();
        let totals = BudgetTotals::compute(&no_items, &tasks);
        assert_eq!(totals, BudgetTotals::default());
    }

    #[test]
    fn empty_budget_is_zero_without_alert() {
        let totals = BudgetTotals::compute(&Vec::<BudgetItem>::new(), &Vec::<Task>::new());
        assert_eq!(totals.total_estimated, 0.0);
        assert_eq!(totals.variance_percent(), None);
        assert_eq!(totals.alert(), BudgetAlert::None);
    }

    #[test]
    fn variance_formula() {
        assert_eq!(variance_percent(200.0, 250.0), Some(25.0));
        assert_eq!(variance_percent(200.0, 150.0), Some(-25.0));
        assert_eq!(variance_percent(0.0, 10.0), None);
    }

    #[test]
    fn alert_thresholds_are_strict() {
        assert_eq!(BudgetAlert::classify(Some(10.0)), BudgetAlert::None);
        assert_eq!(BudgetAlert::classify(Some(10.01)), BudgetAlert::Warning);
        assert_eq!(BudgetAlert::classify(Some(20.0)), BudgetAlert::Warning);
        assert_eq!(BudgetAlert::classify(Some(20.5)), BudgetAlert::Critical);
        assert_eq!(BudgetAlert::classify(Some(-50.0)), BudgetAlert::None);
        assert_eq!(BudgetAlert::classify(None), BudgetAlert::None);
    }

    #[test]
    fn view_reports_alert_and_remaining() {
        let now = Utc::now();
        let totals = BudgetTotals::from_parts(1000.0, 1150.0, 0.0, 0.0);
        let budget = Budget {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            currency: "EUR".into(),
            total_estimated: totals.total_estimated,
            total_actual: totals.total_actual,
            items_estimated: totals.items_estimated,
            items_actual: totals.items_actual,
            tasks_estimated: 0.0,
            tasks_actual: 0.0,
            recalculated_at: now,
            created_at: now,
            updated_at: now,
        };

        let view = BudgetView::from(budget);
        assert_eq!(view.variance_percent, Some(15.0));
        assert_eq!(view.alert, BudgetAlert::Warning);
        assert_eq!(view.remaining, -150.0);
    }
}
