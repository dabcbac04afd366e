/// Background runtime
///
/// Periodic jobs that run next to the HTTP server:
/// - marking milestones overdue once their due date has passed
/// - reporting ordered resources whose delivery is late
/// - purging expired login sessions

// Cron-driven overdue sweep
pub mod scheduler;

pub use scheduler::{OverdueSweep, SweepReport, SweepScheduler};
