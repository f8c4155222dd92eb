use std::sync::Arc;

use automate_backend::jobs::{InMemoryJobQueue, JobConfig, JobScheduler, WorkflowJobRunner};
use automate_backend::services::{InMemoryEntityStore, InMemoryQueryIndex, SmtpMailSender};
use automate_backend::workflows::{
    ActionExecutorFactory, Collaborators, InMemoryWorkflowStore, QueuedWorkflowLauncher, WorkflowService,
};
use automate_backend::{Config, init_tracing};

/// Standalone job worker: polls the workflow job queue until Ctrl-C.
///
/// This binary shows the wiring only. Its stores and queue are empty in-memory
/// instances, so a deployment substitutes persistent entity and workflow stores
/// and a durable job queue shared with the process that raises workflow events.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing()?;

    if !config.smtp.is_configured() {
        tracing::warn!("SMTP is not configured; workflow emails will fail to send");
    }

    let entity_store = Arc::new(InMemoryEntityStore::new());
    let job_queue = Arc::new(InMemoryJobQueue::new());
    let collaborators = Collaborators {
        entity_store: entity_store.clone(),
        query_index: Arc::new(InMemoryQueryIndex::new(entity_store)),
        job_queue: job_queue.clone(),
        mail_sender: Arc::new(SmtpMailSender::new(&config.smtp)?),
        launcher: Arc::new(QueuedWorkflowLauncher::new(job_queue.clone())),
    };

    let factory = ActionExecutorFactory::new(collaborators, &config)?;
    let service = Arc::new(WorkflowService::new(Arc::new(InMemoryWorkflowStore::new()), factory));
    let runner = Arc::new(WorkflowJobRunner::new(job_queue, service));

    let scheduler = JobScheduler::new(runner, JobConfig::from(&config.workflow)).await?;
    scheduler.start().await?;
    tracing::info!("Workflow worker running for {}", config.application_url);

    tokio::signal::ctrl_c().await?;
    scheduler.shutdown().await?;
    Ok(())
}
