// Workflow Automation Engine
//
// Runs configured action chains against business entities: merge fields,
// conditional branching, and waits that suspend a chain until a delayed job
// resumes it.

pub mod actions;
pub mod conditions;
pub mod engine;
pub mod executor;
pub mod factory;
pub mod launcher;
pub mod merge;
pub mod store;
pub mod triggers;

pub use actions::{Action, ActionParams, ActionType};
pub use conditions::{Condition, ConditionOperator};
pub use engine::{ExecutionReport, WorkflowService};
pub use executor::{ActionExecutor, ExecutorBase, TimeUnit};
pub use factory::{ActionExecutorFactory, Collaborators};
pub use launcher::{QueuedWorkflowLauncher, WorkflowLauncher};
pub use merge::MergeFieldResolver;
pub use store::{InMemoryWorkflowStore, WorkflowDefinition, WorkflowInstance, WorkflowStore};
pub use triggers::{ResumptionPayload, StartWorkflowPayload, WorkflowEvent};
