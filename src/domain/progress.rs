/// Progress summaries derived from task and milestone status

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::{Milestone, MilestoneStatus, Resource, Task, TaskStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressSummary {
    /// Done tasks over all non-cancelled tasks, 0-100
    pub percent_complete: f64,
    pub tasks_total: usize,
    pub tasks_by_status: BTreeMap<String, usize>,
    pub milestones_total: usize,
    pub milestones_by_status: BTreeMap<String, usize>,
    pub overdue_milestones: usize,
    pub overdue_deliveries: usize,
}

/// Percentage of done tasks, ignoring cancelled ones
pub fn percent_complete<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> f64 {
    let (done, countable) = tasks
        .into_iter()
        .filter(|task| task.status != TaskStatus::Cancelled)
        .fold((0usize, 0usize), |(done, countable), task| {
            (done + usize::from(task.status == TaskStatus::Done), countable + 1)
        });

    if countable == 0 {
        return 0.0;
    }
    (done as f64 / countable as f64 * 1000.0).round() / 10.0
}

impl ProgressSummary {
    pub fn compute(
        tasks: &[Task],
        milestones: &[Milestone],
        resources: &[Resource],
        today: NaiveDate,
    ) -> Self {
        let mut tasks_by_status = BTreeMap::new();
        for task in tasks {
            *tasks_by_status.entry(task.status.to_string()).or_insert(0) += 1;
        }

        let mut milestones_by_status = BTreeMap::new();
        for milestone in milestones {
            *milestones_by_status.entry(milestone.status.to_string()).or_insert(0) += 1;
        }

        let overdue_milestones = milestones
            .iter()
            .filter(|m| m.status == MilestoneStatus::Overdue || m.is_overdue(today))
            .count();

        Self {
            percent_complete: percent_complete(tasks),
            tasks_total: tasks.len(),
            tasks_by_status,
            milestones_total: milestones.len(),
            milestones_by_status,
            overdue_milestones,
            overdue_deliveries: resources.iter().filter(|r| r.is_delivery_overdue(today)).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskPriority;
    use chrono::Utc;
    use uuid::Uuid;

    fn task(status: TaskStatus) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            project_id: Uuid::nil(),
            milestone_id: None,
            assignee_id: None,
            template_id: None,
            title: "task".into(),
            description: None,
            status,
            priority: TaskPriority::Low,
            due_date: None,
            estimated_price: None,
            actual_price: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn percent_ignores_cancelled() {
        let tasks = vec![
            task(TaskStatus::Done),
            task(TaskStatus::Todo),
            task(TaskStatus::InProgress),
            task(TaskStatus::Cancelled),
        ];
        assert_eq!(percent_complete(&tasks), 33.3);
    }

    #[test]
    fn no_tasks_means_zero() {
        assert_eq!(percent_complete(&Vec::<Task>::new()), 0.0);
        assert_eq!(percent_complete(&vec![task(TaskStatus::Cancelled)]), 0.0);
    }

    #[test]
    fn summary_counts_by_status() {
        let tasks = vec![task(TaskStatus::Done), task(TaskStatus::Done)];
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let summary = ProgressSummary::compute(&tasks, &[], &[], today);
        assert_eq!(summary.percent_complete, 100.0);
        assert_eq!(summary.tasks_by_status.get("done"), Some(&2));
        assert_eq!(summary.overdue_milestones, 0);
    }
}
