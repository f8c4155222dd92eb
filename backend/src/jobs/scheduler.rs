// Job Scheduler - polls the workflow job queue on a cron schedule

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler as TokioScheduler, JobSchedulerError};
use tracing::info;
use uuid::Uuid;

use super::runner::WorkflowJobRunner;
use crate::config::WorkflowConfig;

const MAX_EXECUTION_LOGS: usize = 100;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Scheduler error: {0}")]
    SchedulerError(#[from] JobSchedulerError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type JobResult<T> = Result<T, JobError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Seconds between polls of the job queue (1-59)
    pub poll_interval_seconds: u32,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 30,
        }
    }
}

impl From<&WorkflowConfig> for JobConfig {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            poll_interval_seconds: config.job_poll_interval_secs,
        }
    }
}

impl JobConfig {
    pub fn cron_expression(&self) -> JobResult<String> {
        if !(1..=59).contains(&self.poll_interval_seconds) {
            return Err(JobError::ConfigError(format!(
                "poll interval must be between 1 and 59 seconds, got {}",
                self.poll_interval_seconds
            )));
        }
        Ok(format!("*/{} * * * * *", self.poll_interval_seconds))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobExecutionLog {
    pub id: Uuid,
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub items_processed: i32,
    pub errors: Vec<String>,
    pub duration_ms: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
    PartialFailure,
}

pub struct JobScheduler {
    scheduler: TokioScheduler,
    runner: Arc<WorkflowJobRunner>,
    config: JobConfig,
    execution_logs: Arc<RwLock<Vec<JobExecutionLog>>>,
}

impl JobScheduler {
    pub async fn new(runner: Arc<WorkflowJobRunner>, config: JobConfig) -> JobResult<Self> {
        let scheduler = TokioScheduler::new().await?;

        Ok(Self {
            scheduler,
            runner,
            config,
            execution_logs: Arc::new(RwLock::new(Vec::new())),
        })
    }

    pub async fn start(&self) -> JobResult<()> {
        info!("Starting workflow job scheduler");

        self.schedule_workflow_jobs().await?;
        self.scheduler.start().await?;

        info!("Workflow job scheduler started successfully");
        Ok(())
    }

    pub async fn shutdown(&self) -> JobResult<()> {
        info!("Shutting down workflow job scheduler");
        let mut scheduler = self.scheduler.clone();
        scheduler.shutdown().await?;
        Ok(())
    }

    /// Runs due jobs once, outside the schedule.
    pub async fn run_now(&self) -> JobExecutionLog {
        let log = run_and_log(&self.runner, Utc::now()).await;
        record(&self.execution_logs, log.clone()).await;
        log
    }

    async fn schedule_workflow_jobs(&self) -> JobResult<()> {
        let cron_expr = self.config.cron_expression()?;
        let runner = self.runner.clone();
        let logs = self.execution_logs.clone();

        let job = Job::new_async(cron_expr.as_str(), move |_uuid, _lock| {
            let runner = runner.clone();
            let logs = logs.clone();

            Box::pin(async move {
                let log = run_and_log(&runner, Utc::now()).await;
                record(&logs, log).await;
            })
        })?;

        self.scheduler.add(job).await?;
        info!(
            "Scheduled workflow job poller to run every {} seconds",
            self.config.poll_interval_seconds
        );

        Ok(())
    }

    pub async fn get_execution_logs(&self) -> Vec<JobExecutionLog> {
        self.execution_logs.read().await.clone()
    }
}

async fn run_and_log(runner: &WorkflowJobRunner, now: DateTime<Utc>) -> JobExecutionLog {
    let started_at = Utc::now();
    let summary = runner.run_due(now).await;
    let completed_at = Utc::now();

    let status = match (summary.jobs_processed, summary.jobs_failed) {
        (_, 0) => JobStatus::Completed,
        (0, _) => JobStatus::Failed,
        _ => JobStatus::PartialFailure,
    };

    JobExecutionLog {
        id: Uuid::new_v4(),
        job_name: "Workflow Jobs".to_string(),
        started_at,
        completed_at: Some(completed_at),
        status,
        items_processed: summary.jobs_processed,
        errors: summary.errors,
        duration_ms: Some((completed_at - started_at).num_milliseconds()),
    }
}

async fn record(logs: &RwLock<Vec<JobExecutionLog>>, log: JobExecutionLog) {
    let mut logs = logs.write().await;
    logs.push(log);
    // Keep only the most recent logs
    if logs.len() > MAX_EXECUTION_LOGS {
        logs.remove(0);
    }
}
