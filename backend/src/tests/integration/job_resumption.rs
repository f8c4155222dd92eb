// Suspended chains resumed by the job runner

use chrono::{Duration, Utc};
use serde_json::json;

use crate::jobs::{JobHandler, JobQueue};
use crate::tests::fixtures::ACCOUNT;
use crate::tests::helpers::TestContext;
use crate::workflows::{Action, Condition, WorkflowDefinition, WorkflowEvent};

/// Wait two days, then escalate and mail the owner if the case is still open.
async fn escalation_workflow(ctx: &TestContext) -> Action {
    let workflow = WorkflowDefinition::new(ACCOUNT, "Stale case escalation", "case").on(WorkflowEvent::Create);
    let wait = Action::wait("day", 2).in_workflow(ACCOUNT, &workflow.id);
    let still_open = Action::check_condition(vec![Condition::equals("status", "open")]).child_of(&wait);
    let escalate = Action::update_field("status", "escalated").child_of(&still_open);
    let notify = Action::send_email("<%owner_id.email%>", "Escalated: <%title%>", "See <%entity_link%>")
        .child_of(&still_open);
    ctx.workflows.add_workflow(workflow).await;
    for action in [wait.clone(), still_open, escalate, notify] {
        ctx.workflows.add_action(action).await;
    }
    wait
}

#[tokio::test]
async fn test_wait_resumes_after_due_time() {
    let ctx = TestContext::new().await;
    ctx.add_team_members("t-support", &["u1"]).await;
    escalation_workflow(&ctx).await;

    let mut case = ctx.saved_case("E1").await;
    case.set_value("owner_id", json!("u1"));
    ctx.entity_store.insert(case.clone()).await;

    let report = ctx
        .service()
        .run_workflows_on_event(&mut case, WorkflowEvent::Create, &ctx.user)
        .await
        .unwrap();
    assert_eq!(report.actions_halted, 1);

    let runner = ctx.job_runner();
    let early = runner.run_due(Utc::now()).await;
    assert_eq!(early.jobs_processed, 0);
    assert_eq!(ctx.job_queue.len().await, 1);

    let later = Utc::now() + Duration::days(2) + Duration::minutes(1);
    let summary = runner.run_due(later).await;
    assert_eq!(summary.jobs_processed, 1);
    assert_eq!(summary.jobs_failed, 0);
    assert!(summary.errors.is_empty());

    let stored = ctx.entity_store.find("E1").await.unwrap();
    assert_eq!(stored.get_value_text("status"), "escalated");

    let owner_email = ctx.entity_store.find("u1").await.unwrap().get_value_text("email");
    let sent = ctx.mail.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec![owner_email]);
    assert_eq!(sent[0].subject, "Escalated: Printer jammed");
    assert_eq!(sent[0].body, "See https://crm.example.com/browse/E1");

    // Consumed once
    let again = runner.run_due(later).await;
    assert_eq!(again.jobs_processed, 0);
    assert_eq!(ctx.mail.sent().len(), 1);
}

#[tokio::test]
async fn test_resumed_children_see_current_state() {
    let ctx = TestContext::new().await;
    escalation_workflow(&ctx).await;

    let mut case = ctx.saved_case("E1").await;
    ctx.service()
        .run_workflows_on_event(&mut case, WorkflowEvent::Create, &ctx.user)
        .await
        .unwrap();

    // Closed while the chain was suspended
    ctx.entity_store
        .insert(case.clone().with_value("status", "closed"))
        .await;

    let summary = ctx
        .job_runner()
        .run_due(Utc::now() + Duration::days(3))
        .await;

    assert_eq!(summary.jobs_processed, 1);
    let stored = ctx.entity_store.find("E1").await.unwrap();
    assert_eq!(stored.get_value_text("status"), "closed");
    assert!(ctx.mail.sent().is_empty());
}

#[tokio::test]
async fn test_resume_after_action_removed_is_skipped() {
    let ctx = TestContext::new().await;
    let wait = escalation_workflow(&ctx).await;

    let mut case = ctx.saved_case("E1").await;
    ctx.service()
        .run_workflows_on_event(&mut case, WorkflowEvent::Create, &ctx.user)
        .await
        .unwrap();
    ctx.workflows.remove_action(&wait.id).await;

    let summary = ctx
        .job_runner()
        .run_due(Utc::now() + Duration::days(3))
        .await;

    assert_eq!(summary.jobs_processed, 1);
    assert_eq!(summary.jobs_failed, 0);
    assert_eq!(ctx.entity_store.find("E1").await.unwrap().get_value_text("status"), "open");
    assert!(ctx.job_queue.is_empty().await);
}

#[tokio::test]
async fn test_malformed_job_payload_fails_alone() {
    let ctx = TestContext::new().await;
    escalation_workflow(&ctx).await;
    let mut case = ctx.saved_case("E1").await;
    ctx.service()
        .run_workflows_on_event(&mut case, WorkflowEvent::Create, &ctx.user)
        .await
        .unwrap();

    ctx.job_queue
        .run_now(JobHandler::WorkflowWaitAction, json!({"action_id": 7}))
        .await
        .unwrap();

    let summary = ctx
        .job_runner()
        .run_due(Utc::now() + Duration::days(3))
        .await;

    assert_eq!(summary.jobs_failed, 1);
    assert_eq!(summary.jobs_processed, 1);
    assert_eq!(ctx.entity_store.find("E1").await.unwrap().get_value_text("status"), "escalated");
}

#[tokio::test]
async fn test_start_workflow_action_runs_target_via_queue() {
    let ctx = TestContext::new().await;
    let follow_up = WorkflowDefinition::new(ACCOUNT, "Follow-up", "case").with_id("wf-follow-up");
    let note = Action::update_field("notes", "follow-up started").in_workflow(ACCOUNT, &follow_up.id);
    let trigger = WorkflowDefinition::new(ACCOUNT, "Kick off", "case").on(WorkflowEvent::Update);
    let start = Action::start_workflow("wf-follow-up").in_workflow(ACCOUNT, &trigger.id);
    ctx.workflows.add_workflow(follow_up).await;
    ctx.workflows.add_workflow(trigger).await;
    ctx.workflows.add_action(note).await;
    ctx.workflows.add_action(start).await;

    let mut case = ctx.saved_case("E1").await;
    let report = ctx
        .service()
        .run_workflows_on_event(&mut case, WorkflowEvent::Update, &ctx.user)
        .await
        .unwrap();
    assert_eq!(report.workflows_started, 1);
    assert_eq!(case.get_value("notes"), None);

    let summary = ctx.job_runner().run_due(Utc::now()).await;
    assert_eq!(summary.jobs_processed, 1);

    let stored = ctx.entity_store.find("E1").await.unwrap();
    assert_eq!(stored.get_value_text("notes"), "follow-up started");
    let instances = ctx.workflows.instances().await;
    assert_eq!(instances.len(), 2);
    assert!(instances.iter().any(|i| i.workflow_id == "wf-follow-up" && i.started_by == ctx.user.entity_id));
}
