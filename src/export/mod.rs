/// Project report export

pub mod pdf;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{task::TaskFilter, BudgetView, Milestone, ProgressSummary, Project, Task};
use crate::error::ServiceResult;
use crate::services::Services;

pub use pdf::render_project_report;

/// Everything a project report shows, gathered in one place
#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    pub project: Project,
    pub budget: BudgetView,
    pub progress: ProgressSummary,
    pub milestones: Vec<Milestone>,
    pub tasks: Vec<Task>,
    pub generated_on: NaiveDate,
}

impl ProjectReport {
    pub async fn collect(services: &Services, project: Project, today: NaiveDate) -> ServiceResult<Self> {
        let budget = services.budget.get(project.id).await?;
        let progress = services.projects.progress(project.id, today).await?;
        let milestones = services.milestones.list(project.id).await?;
        let tasks = services.tasks.list(project.id, &TaskFilter::default()).await?;

        Ok(Self {
            project,
            budget,
            progress,
            milestones,
            tasks,
            generated_on: today,
        })
    }
}
