use async_trait::async_trait;
use automate_shared::{Entity, User, value_to_text};
use chrono::{DateTime, Days, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use super::{ActionExecutor, ExecutorBase};
use crate::error::{ActionError, WorkflowError, WorkflowResult};
use crate::jobs::{JobHandler, JobQueue};
use crate::workflows::triggers::ResumptionPayload;

/// Calendar units a wait can be expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    /// Accepts unit names (singular or plural) and the stored codes 1-6.
    pub fn parse(raw: &str) -> WorkflowResult<Self> {
        let name = raw.trim().to_lowercase();
        let unit = match name.as_str() {
            "1" | "minute" | "minutes" => Self::Minute,
            "2" | "hour" | "hours" => Self::Hour,
            "3" | "day" | "days" => Self::Day,
            "4" | "week" | "weeks" => Self::Week,
            "5" | "month" | "months" => Self::Month,
            "6" | "year" | "years" => Self::Year,
            _ => {
                return Err(WorkflowError::invalid_argument(format!(
                    "unrecognized time unit '{raw}'"
                )));
            }
        };
        Ok(unit)
    }

    /// `from` moved forward by `interval` units using calendar arithmetic.
    pub fn advance(self, from: DateTime<Utc>, interval: u32) -> WorkflowResult<DateTime<Utc>> {
        let n = u64::from(interval);
        let advanced = match self {
            Self::Minute => from.checked_add_signed(Duration::minutes(i64::from(interval))),
            Self::Hour => from.checked_add_signed(Duration::hours(i64::from(interval))),
            Self::Day => from.checked_add_days(Days::new(n)),
            Self::Week => from.checked_add_days(Days::new(n * 7)),
            Self::Month => from.checked_add_months(Months::new(interval)),
            Self::Year => interval
                .checked_mul(12)
                .and_then(|months| from.checked_add_months(Months::new(months))),
        };
        advanced.ok_or_else(|| {
            WorkflowError::invalid_argument(format!("waiting {interval} {self:?} is out of range"))
        })
    }
}

/// Suspends the chain for a real-world delay.
///
/// Nothing sleeps: the executor queues a `workflow_wait_action` job carrying a
/// [`ResumptionPayload`] and answers `false`. The job handler later runs this
/// action's children against the entity's state at that time.
pub struct WaitConditionExecutor {
    base: ExecutorBase,
    job_queue: Arc<dyn JobQueue>,
}

impl WaitConditionExecutor {
    pub fn new(base: ExecutorBase, job_queue: Arc<dyn JobQueue>) -> Self {
        Self { base, job_queue }
    }

    pub(crate) async fn execute_at(
        &mut self,
        entity: &Entity,
        user: &User,
        now: DateTime<Utc>,
    ) -> WorkflowResult<bool> {
        let Some(entity_id) = entity.entity_id().map(str::to_string) else {
            return Ok(false);
        };

        let unit = self.base.get_param_text("when_unit", entity).await?;
        let interval = parse_interval(self.base.get_param("when_interval", entity).await?)?;

        let unit = match unit {
            Some(unit) if unit != "0" && interval > 0 => TimeUnit::parse(&unit)?,
            _ => return Ok(true),
        };

        let execute_at = unit.advance(now, interval)?;
        let delay_seconds = u64::try_from((execute_at - now).num_seconds()).unwrap_or(0);

        let action = self.base.action();
        let payload = ResumptionPayload {
            action_id: action.id.clone(),
            account_id: action.account_id.clone(),
            entity_id: entity_id.clone(),
            user_id: user.entity_id.clone(),
        };
        let action_id = action.id.clone();

        match self
            .job_queue
            .schedule_delayed(JobHandler::WorkflowWaitAction, serde_json::to_value(&payload)?, delay_seconds)
            .await
        {
            Ok(job_id) => {
                info!(
                    action_id = %action_id,
                    entity_id = %entity_id,
                    job_id = %job_id,
                    "Workflow suspended until {}",
                    execute_at
                );
            }
            Err(e) => {
                error!(action_id = %action_id, "Failed to schedule wait: {}", e);
                self.base.add_error(format!("Could not schedule the wait: {e}"));
            }
        }

        Ok(false)
    }
}

fn parse_interval(value: Option<Value>) -> WorkflowResult<u32> {
    let Some(value) = value else {
        return Ok(0);
    };
    let text = value_to_text(&value);
    let text = text.trim();
    if text.is_empty() {
        return Ok(0);
    }
    text.parse::<u32>()
        .map_err(|_| WorkflowError::invalid_argument(format!("invalid wait interval '{text}'")))
}

#[async_trait]
impl ActionExecutor for WaitConditionExecutor {
    async fn execute(&mut self, entity: &mut Entity, user: &User) -> WorkflowResult<bool> {
        self.execute_at(entity, user, Utc::now()).await
    }

    fn errors(&self) -> &[ActionError] {
        self.base.errors()
    }
}
