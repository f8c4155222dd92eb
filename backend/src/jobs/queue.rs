// Job Queue - delayed and immediate one-shot jobs for workflow continuations

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::scheduler::{JobError, JobResult};

/// Names the handler a queued job is dispatched to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobHandler {
    /// Resume a workflow after a wait action
    WorkflowWaitAction,
    /// Start a workflow for an entity
    WorkflowStart,
}

impl JobHandler {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkflowWaitAction => "workflow_wait_action",
            Self::WorkflowStart => "workflow_start",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedJob {
    pub id: Uuid,
    pub handler: JobHandler,
    pub payload: Value,
    pub run_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Queues a one-shot invocation `delay_seconds` from now.
    async fn schedule_delayed(&self, handler: JobHandler, payload: Value, delay_seconds: u64) -> JobResult<Uuid>;

    /// Queues an invocation that is due immediately.
    async fn run_now(&self, handler: JobHandler, payload: Value) -> JobResult<Uuid>;
}

#[derive(Default)]
pub struct InMemoryJobQueue {
    jobs: Mutex<Vec<QueuedJob>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn pending(&self) -> Vec<QueuedJob> {
        self.jobs.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }

    /// Removes and returns every job due at `now`, oldest due time first.
    pub async fn take_due(&self, now: DateTime<Utc>) -> Vec<QueuedJob> {
        let mut jobs = self.jobs.lock().await;
        let (mut due, waiting): (Vec<QueuedJob>, Vec<QueuedJob>) =
            jobs.drain(..).partition(|job| job.run_at <= now);
        *jobs = waiting;
        due.sort_by_key(|job| (job.run_at, job.created_at));
        due
    }

    async fn push(&self, handler: JobHandler, payload: Value, run_at: DateTime<Utc>) -> Uuid {
        let job = QueuedJob {
            id: Uuid::new_v4(),
            handler,
            payload,
            run_at,
            created_at: Utc::now(),
        };
        let id = job.id;
        debug!(job_id = %id, handler = handler.as_str(), "Queued job for {}", run_at);
        self.jobs.lock().await.push(job);
        id
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn schedule_delayed(&self, handler: JobHandler, payload: Value, delay_seconds: u64) -> JobResult<Uuid> {
        let delay = i64::try_from(delay_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| JobError::ConfigError(format!("delay of {delay_seconds}s is out of range")))?;
        let run_at = Utc::now()
            .checked_add_signed(delay)
            .ok_or_else(|| JobError::ConfigError(format!("delay of {delay_seconds}s is out of range")))?;

        Ok(self.push(handler, payload, run_at).await)
    }

    async fn run_now(&self, handler: JobHandler, payload: Value) -> JobResult<Uuid> {
        Ok(self.push(handler, payload, Utc::now()).await)
    }
}
