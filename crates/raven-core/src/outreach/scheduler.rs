//! Cron scheduling for the proactive outreach.
//!
//! Uses tokio-cron-scheduler with the schedule evaluated in local time.

use chrono::Local;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info};
use uuid::Uuid;

use super::{Outreach, OutreachResult};
use crate::error::{RavenError, RavenResult};

/// Runs [`Outreach::run_once`] on a cron schedule.
pub struct OutreachScheduler {
    scheduler: JobScheduler,
    outreach: Outreach,
    cron: String,
    job_id: Option<Uuid>,
}

impl OutreachScheduler {
    /// Create a new scheduler.
    ///
    /// Note: Call `start()` to register the job and begin execution.
    pub async fn new(outreach: Outreach, cron: impl Into<String>) -> RavenResult<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| RavenError::Scheduler(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            outreach,
            cron: cron.into(),
            job_id: None,
        })
    }

    pub fn cron(&self) -> &str {
        &self.cron
    }

    /// Id of the registered job, once started.
    pub fn job_id(&self) -> Option<Uuid> {
        self.job_id
    }

    /// Register the outreach job and start the scheduler.
    ///
    /// An invalid cron expression is reported here.
    pub async fn start(&mut self) -> RavenResult<()> {
        let outreach = self.outreach.clone();

        let job = Job::new_async_tz(self.cron.as_str(), Local, move |_uuid, _lock| {
            let outreach = outreach.clone();
            Box::pin(async move {
                debug!("Starting scheduled outreach");
                match outreach.run_once().await {
                    OutreachResult::Delivered { destination, .. } => {
                        debug!(destination = %destination, "Scheduled outreach done");
                    }
                    OutreachResult::Skipped { reason } => {
                        debug!(reason = %reason, "Scheduled outreach skipped");
                    }
                    // already logged by run_once
                    OutreachResult::Failed { .. } => {}
                }
            })
        })
        .map_err(|e| {
            RavenError::Scheduler(format!("Invalid outreach schedule '{}': {}", self.cron, e))
        })?;

        let job_id = job.guid();
        self.scheduler
            .add(job)
            .await
            .map_err(|e| RavenError::Scheduler(format!("Failed to add job: {}", e)))?;
        self.scheduler
            .start()
            .await
            .map_err(|e| RavenError::Scheduler(format!("Failed to start scheduler: {}", e)))?;

        self.job_id = Some(job_id);
        info!(
            cron = %self.cron,
            destination = self.outreach.destination().unwrap_or("-"),
            "Outreach scheduler started"
        );
        Ok(())
    }

    /// Stop the scheduler gracefully.
    pub async fn shutdown(&mut self) -> RavenResult<()> {
        info!("Shutting down outreach scheduler");
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| RavenError::Scheduler(e.to_string()))
    }

    /// Run the outreach now, outside the schedule.
    pub async fn run_now(&self) -> OutreachResult {
        self.outreach.run_once().await
    }
}
