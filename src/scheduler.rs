use crate::config::Config;
use crate::plugin::{HookRun, PluginRegistry};
use anyhow::Result;
use std::sync::{Arc, Mutex, TryLockError};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

/// Outcome of a cron trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CronOutcome {
    Completed(HookRun),
    /// Another run held the cron lock
    Skipped,
}

/// Runs the plugins' cron hooks, one run at a time.
#[derive(Debug)]
pub struct CronRunner {
    config: Arc<Config>,
    plugins: Arc<PluginRegistry>,
    lock: Mutex<()>,
}

impl CronRunner {
    pub fn new(config: Arc<Config>, plugins: Arc<PluginRegistry>) -> Self {
        Self {
            config,
            plugins,
            lock: Mutex::new(()),
        }
    }

    /// Run every cron hook unless a run is already in progress, in which case
    /// return at once. Blocks for the duration of the hooks.
    pub fn run(&self) -> CronOutcome {
        let _guard = match self.lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                info!("Cron run already in progress, skipping");
                return CronOutcome::Skipped;
            }
            Err(TryLockError::Poisoned(poisoned)) => {
                warn!("Cron lock poisoned by a previous run, continuing");
                poisoned.into_inner()
            }
        };

        info!("Starting cron run");
        let run = self.plugins.run_cron(&self.config);
        info!("✓ Cron run finished: {} hooks, {} failed", run.ran, run.failed);
        CronOutcome::Completed(run)
    }
}

/// Initialize and start the scheduler that triggers cron runs on `schedule`
/// (6-field cron expression, seconds first).
pub async fn start_scheduler(schedule: &str, runner: Arc<CronRunner>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    info!("Scheduling cron runs (cron: {})", schedule);
    let job = Job::new_async(schedule, move |_uuid, _l| {
        let runner = Arc::clone(&runner);

        Box::pin(async move {
            info!("⏰ Scheduled cron run triggered");
            if let Err(e) = tokio::task::spawn_blocking(move || runner.run()).await {
                error!("Scheduled cron run failed: {}", e);
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    info!("✓ Scheduler started");

    Ok(scheduler)
}
