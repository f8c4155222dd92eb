// Workflow Job Runner - dispatches due queue jobs to the workflow service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use super::queue::{InMemoryJobQueue, JobHandler, QueuedJob};
use crate::error::WorkflowResult;
use crate::workflows::{ExecutionReport, ResumptionPayload, StartWorkflowPayload, WorkflowService};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobRunSummary {
    pub jobs_processed: i32,
    pub jobs_failed: i32,
    pub errors: Vec<String>,
}

pub struct WorkflowJobRunner {
    queue: Arc<InMemoryJobQueue>,
    service: Arc<WorkflowService>,
}

impl WorkflowJobRunner {
    pub fn new(queue: Arc<InMemoryJobQueue>, service: Arc<WorkflowService>) -> Self {
        Self { queue, service }
    }

    /// Runs every job due at `now`. Each job is taken off the queue first,
    /// so it is consumed once even when it fails.
    pub async fn run_due(&self, now: DateTime<Utc>) -> JobRunSummary {
        let mut summary = JobRunSummary::default();

        for job in self.queue.take_due(now).await {
            match self.dispatch(&job).await {
                Ok(report) => {
                    summary.jobs_processed += 1;
                    summary.errors.extend(report.errors);
                }
                Err(e) => {
                    error!(job_id = %job.id, handler = job.handler.as_str(), code = e.error_code(), "Job failed: {}", e);
                    summary.jobs_failed += 1;
                    summary.errors.push(format!("{} [{}]: {}", job.id, e.error_code(), e));
                }
            }
        }

        if summary.jobs_processed + summary.jobs_failed > 0 {
            info!(
                "Workflow jobs run: {} processed, {} failed",
                summary.jobs_processed, summary.jobs_failed
            );
        }
        summary
    }

    pub async fn dispatch(&self, job: &QueuedJob) -> WorkflowResult<ExecutionReport> {
        match job.handler {
            JobHandler::WorkflowWaitAction => {
                let payload: ResumptionPayload = serde_json::from_value(job.payload.clone())?;
                self.service.resume_wait_action(&payload).await
            }
            JobHandler::WorkflowStart => {
                let payload: StartWorkflowPayload = serde_json::from_value(job.payload.clone())?;
                self.service.start_workflow(&payload).await
            }
        }
    }
}
