use async_trait::async_trait;
use automate_shared::{Entity, User};
use std::sync::{Arc, Mutex, Once};

use super::fixtures::{self, ACCOUNT, APPLICATION_URL, WORKFLOW_ID};
use crate::config::{Config, SmtpConfig, WorkflowConfig};
use crate::jobs::{InMemoryJobQueue, WorkflowJobRunner};
use crate::services::{
    InMemoryEntityStore, InMemoryQueryIndex, MailError, MailSender, OutgoingEmail,
};
use crate::workflows::{
    Action, ActionExecutorFactory, Collaborators, ExecutorBase, InMemoryWorkflowStore,
    QueuedWorkflowLauncher, WorkflowLauncher, WorkflowService,
};

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .try_init()
            .ok();
    });
}

/// Mail sender that keeps every message it is given
#[derive(Default)]
pub struct RecordingMailSender {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailSender {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailSender for RecordingMailSender {
    async fn send(&self, message: &OutgoingEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// In-memory collaborators wired the way the service wires them
pub struct TestContext {
    pub config: Config,
    pub entity_store: Arc<InMemoryEntityStore>,
    pub query_index: Arc<InMemoryQueryIndex>,
    pub job_queue: Arc<InMemoryJobQueue>,
    pub mail: Arc<RecordingMailSender>,
    pub workflows: Arc<InMemoryWorkflowStore>,
    pub user: User,
}

impl TestContext {
    pub async fn new() -> Self {
        init_test_logging();

        let entity_store = Arc::new(InMemoryEntityStore::new());
        entity_store.register_definition(fixtures::user_definition()).await;
        entity_store.register_definition(fixtures::case_definition()).await;
        entity_store.register_definition(fixtures::template_definition()).await;

        Self {
            config: test_config(),
            query_index: Arc::new(InMemoryQueryIndex::new(entity_store.clone())),
            entity_store,
            job_queue: Arc::new(InMemoryJobQueue::new()),
            mail: Arc::new(RecordingMailSender::default()),
            workflows: Arc::new(InMemoryWorkflowStore::new()),
            user: fixtures::acting_user(),
        }
    }

    /// Places a detached action into the test account's workflow.
    pub fn in_workflow(&self, action: Action) -> Action {
        if action.account_id.is_empty() {
            action.in_workflow(ACCOUNT, WORKFLOW_ID)
        } else {
            action
        }
    }

    pub fn base(&self, action: Action) -> ExecutorBase {
        ExecutorBase::new(self.entity_store.clone(), self.in_workflow(action), &self.config.application_url)
            .with_max_merge_iterations(self.config.workflow.max_merge_iterations)
    }

    pub fn launcher(&self) -> Arc<dyn WorkflowLauncher> {
        Arc::new(QueuedWorkflowLauncher::new(self.job_queue.clone()))
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            entity_store: self.entity_store.clone(),
            query_index: self.query_index.clone(),
            job_queue: self.job_queue.clone(),
            mail_sender: self.mail.clone(),
            launcher: self.launcher(),
        }
    }

    pub fn factory(&self) -> ActionExecutorFactory {
        ActionExecutorFactory::new(self.collaborators(), &self.config).expect("Failed to build factory")
    }

    pub fn service(&self) -> Arc<WorkflowService> {
        Arc::new(WorkflowService::new(self.workflows.clone(), self.factory()))
    }

    pub fn job_runner(&self) -> WorkflowJobRunner {
        WorkflowJobRunner::new(self.job_queue.clone(), self.service())
    }

    pub async fn saved_case(&self, id: &str) -> Entity {
        let case = fixtures::case(id, ACCOUNT);
        self.entity_store.insert(case.clone()).await;
        case
    }

    pub fn unsaved_case(&self) -> Entity {
        let mut case = fixtures::case("", ACCOUNT);
        case.entity_id = None;
        case
    }

    pub async fn add_team_members(&self, team_id: &str, user_ids: &[&str]) {
        for id in user_ids {
            self.entity_store
                .insert(fixtures::user(id, ACCOUNT).with_value("team_id", team_id))
                .await;
        }
    }

    pub async fn add_group_member(&self, user_id: &str, group_id: &str) {
        self.entity_store
            .insert(fixtures::user(user_id, ACCOUNT).with_value("groups", vec![group_id]))
            .await;
    }
}

pub fn test_config() -> Config {
    Config {
        application_url: APPLICATION_URL.to_string(),
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            username: String::new(),
            password: String::new(),
            from_email: "automation@example.com".to_string(),
            from_name: "Automation".to_string(),
            use_tls: false,
        },
        workflow: WorkflowConfig {
            webhook_timeout_secs: 5,
            ..WorkflowConfig::default()
        },
    }
}
