/// Background overdue sweep on a cron schedule
///
/// Uses tokio-cron-scheduler to run `OverdueSweep::run_once` periodically.
/// The sweep itself is plain async code so it can also be triggered directly.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::error::ServiceResult;
use crate::services::Services;

/// What one sweep changed or found
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    pub milestones_marked_overdue: u64,
    pub overdue_deliveries: usize,
    pub sessions_purged: u64,
}

/// Overdue detection and housekeeping across all projects
#[derive(Debug, Clone)]
pub struct OverdueSweep {
    services: Services,
}

impl OverdueSweep {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Mark overdue milestones, report late deliveries and purge expired sessions
    pub async fn run_once(&self, today: NaiveDate) -> ServiceResult<SweepReport> {
        let milestones_marked_overdue = self.services.milestones.mark_overdue(today).await?;
        if milestones_marked_overdue > 0 {
            tracing::info!("⏰ Marked {} milestones overdue", milestones_marked_overdue);
        }

        let late = self.services.resources.overdue_deliveries(today).await?;
        let mut per_project: BTreeMap<Uuid, Vec<&str>> = BTreeMap::new();
        for resource in &late {
            per_project
                .entry(resource.project_id)
                .or_default()
                .push(resource.name.as_str());
        }
        for (project_id, names) in &per_project {
            tracing::warn!(
                "🚚 Project {} has {} overdue deliveries: {}",
                project_id,
                names.len(),
                names.join(", ")
            );
        }

        let sessions_purged = self.services.users.purge_expired(Utc::now()).await?;
        if sessions_purged > 0 {
            tracing::debug!("🧹 Purged {} expired sessions", sessions_purged);
        }

        Ok(SweepReport {
            milestones_marked_overdue,
            overdue_deliveries: late.len(),
            sessions_purged,
        })
    }
}

/// Cron-driven runner for the overdue sweep
pub struct SweepScheduler {
    scheduler: Arc<RwLock<JobScheduler>>,
    sweep: Arc<OverdueSweep>,
    job_id: RwLock<Option<Uuid>>,
}

impl SweepScheduler {
    pub async fn new(sweep: OverdueSweep) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
            sweep: Arc::new(sweep),
            job_id: RwLock::new(None),
        })
    }

    /// Register the sweep job with `schedule` (six-field cron, seconds first) and start
    pub async fn start(&self, schedule: &str) -> Result<()> {
        tracing::info!("⏰ Starting overdue sweep scheduler ({})", schedule);

        let sweep = Arc::clone(&self.sweep);
        let job = Job::new_async(schedule, move |_uuid, _l| {
            let sweep = Arc::clone(&sweep);
            Box::pin(async move {
                let today = Utc::now().date_naive();
                match sweep.run_once(today).await {
                    Ok(report) => {
                        tracing::debug!("✅ Overdue sweep finished: {:?}", report);
                    }
                    Err(e) => {
                        tracing::error!("❌ Overdue sweep failed: {}", e);
                    }
                }
            })
        })?;

        let job_id = {
            let scheduler = self.scheduler.write().await;
            let job_id = scheduler.add(job).await?;
            scheduler.start().await?;
            job_id
        };
        *self.job_id.write().await = Some(job_id);

        tracing::info!("✅ Overdue sweep scheduled");
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        tracing::info!("⏹️ Stopping overdue sweep scheduler");

        if let Some(job_id) = self.job_id.write().await.take() {
            let scheduler = self.scheduler.read().await;
            if let Err(e) = scheduler.remove(&job_id).await {
                tracing::warn!("⚠️ Failed to remove sweep job {}: {}", job_id, e);
            }
        }

        let mut scheduler = self.scheduler.write().await;
        scheduler.shutdown().await?;
        Ok(())
    }
}
