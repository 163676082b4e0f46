//! Daily collection schedule via tokio-cron-scheduler.
//!
//! One job, fired at the configured hour and minute in the configured named
//! timezone. The job and the manual trigger share `run_and_record` so the
//! `/status` endpoint reports both the same way.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Utc;
use chrono_tz::Tz;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use uuid::Uuid;

use piggyback_common::Config;

use crate::{LastRun, RunState};

/// Build and start the scheduler. Returns the scheduler handle and the job
/// id so `/status` can ask for the next tick.
pub async fn start(runs: Arc<RunState>, config: &Config) -> Result<(JobScheduler, Uuid)> {
    let timezone: Tz = config
        .schedule_timezone
        .parse()
        .map_err(|_| anyhow!("invalid SCHEDULE_TIMEZONE {:?}", config.schedule_timezone))?;
    let cron = format!("0 {} {} * * *", config.schedule_minute, config.schedule_hour);

    let scheduler = JobScheduler::new().await?;
    let job_runs = runs.clone();
    let job = Job::new_async_tz(cron.as_str(), timezone, move |_uuid, _lock| {
        let runs = job_runs.clone();
        Box::pin(async move {
            info!("Scheduled collection run starting");
            run_and_record(runs).await;
        })
    })?;
    let job_id = scheduler.add(job).await?;
    scheduler.start().await?;

    info!(cron = %cron, timezone = %timezone, "Daily collection scheduled");
    Ok((scheduler, job_id))
}

/// Execute one run and record the outcome for `/status`.
pub async fn run_and_record(runs: Arc<RunState>) {
    runs.active_runs.fetch_add(1, Ordering::SeqCst);
    let outcome = match runs.runner.run().await {
        Ok(stats) => {
            info!("{stats}");
            LastRun {
                ok: true,
                finished_at: Utc::now(),
                detail: format!(
                    "matched {} of {} classified posts across {} profiles",
                    stats.posts_matched, stats.posts_classified, stats.profiles_processed
                ),
            }
        }
        Err(e) => {
            error!(error = %e, "Collection run failed");
            LastRun {
                ok: false,
                finished_at: Utc::now(),
                detail: e.to_string(),
            }
        }
    };
    *runs.last_run.lock().unwrap() = Some(outcome);
    runs.active_runs.fetch_sub(1, Ordering::SeqCst);
}
