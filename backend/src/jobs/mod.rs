// Background Jobs
//
// Delayed and immediate workflow jobs. Wait actions and start-workflow actions
// queue jobs here; the scheduler polls the queue with tokio-cron-scheduler and
// the runner hands due jobs back to the workflow service.

pub mod queue;
pub mod runner;
pub mod scheduler;

pub use queue::{InMemoryJobQueue, JobHandler, JobQueue, QueuedJob};
pub use runner::{JobRunSummary, WorkflowJobRunner};
pub use scheduler::{JobConfig, JobError, JobExecutionLog, JobResult, JobScheduler, JobStatus};
