// Action chains triggered by entity events

use serde_json::json;

use crate::jobs::JobHandler;
use crate::tests::fixtures::ACCOUNT;
use crate::tests::helpers::TestContext;
use crate::workflows::{Action, Condition, WorkflowDefinition, WorkflowEvent};

#[tokio::test]
async fn test_create_chain_assigns_then_waits() {
    let ctx = TestContext::new().await;
    ctx.add_team_members("t-support", &["u1", "u2"]).await;

    let workflow = WorkflowDefinition::new(ACCOUNT, "New case routing", "case").on(WorkflowEvent::Create);
    let assign = Action::assign_from_team("owner_id", "t-support").in_workflow(ACCOUNT, &workflow.id);
    let wait = Action::wait("days", 2).child_of(&assign);
    let escalate = Action::update_field("status", "escalated").child_of(&wait);
    ctx.workflows.add_workflow(workflow).await;
    ctx.workflows.add_action(assign).await;
    ctx.workflows.add_action(wait.clone()).await;
    ctx.workflows.add_action(escalate).await;

    let mut case = ctx.saved_case("E1").await;
    let report = ctx
        .service()
        .run_workflows_on_event(&mut case, WorkflowEvent::Create, &ctx.user)
        .await
        .unwrap();

    assert_eq!(report.workflows_started, 1);
    assert_eq!(report.actions_executed, 2);
    assert_eq!(report.actions_continued, 1);
    assert_eq!(report.actions_halted, 1);
    assert!(report.errors.is_empty());

    let owner = case.get_value_text("owner_id");
    assert!(owner == "u1" || owner == "u2");
    let stored = ctx.entity_store.find("E1").await.unwrap();
    assert_eq!(stored.get_value_text("owner_id"), owner);
    assert_eq!(stored.get_value_text("status"), "open");

    let pending = ctx.job_queue.pending().await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].handler, JobHandler::WorkflowWaitAction);
    assert_eq!(pending[0].payload["action_id"], json!(wait.id));
    assert_eq!(pending[0].payload["entity_id"], json!("E1"));
}

#[tokio::test]
async fn test_zero_wait_runs_children_inline() {
    let ctx = TestContext::new().await;
    let workflow = WorkflowDefinition::new(ACCOUNT, "Immediate", "case").on(WorkflowEvent::Update);
    let wait = Action::wait("0", 0).in_workflow(ACCOUNT, &workflow.id);
    let note = Action::update_field("notes", "Seen <%title%>").child_of(&wait);
    ctx.workflows.add_workflow(workflow).await;
    ctx.workflows.add_action(wait).await;
    ctx.workflows.add_action(note).await;

    let mut case = ctx.saved_case("E1").await;
    let report = ctx
        .service()
        .run_workflows_on_event(&mut case, WorkflowEvent::Update, &ctx.user)
        .await
        .unwrap();

    assert_eq!(report.actions_continued, 2);
    assert_eq!(case.get_value_text("notes"), "Seen Printer jammed");
    assert!(ctx.job_queue.is_empty().await);
}

#[tokio::test]
async fn test_singleton_workflow_runs_once_per_entity() {
    let ctx = TestContext::new().await;
    let workflow = WorkflowDefinition::new(ACCOUNT, "Tag once", "case")
        .on(WorkflowEvent::Update)
        .singleton();
    let tag = Action::update_field("groups", "g-vip").in_workflow(ACCOUNT, &workflow.id);
    ctx.workflows.add_workflow(workflow).await;
    ctx.workflows.add_action(tag).await;

    let service = ctx.service();
    let mut case = ctx.saved_case("E1").await;
    let first = service
        .run_workflows_on_event(&mut case, WorkflowEvent::Update, &ctx.user)
        .await
        .unwrap();
    let second = service
        .run_workflows_on_event(&mut case, WorkflowEvent::Update, &ctx.user)
        .await
        .unwrap();

    assert_eq!(first.workflows_started, 1);
    assert_eq!(second.workflows_started, 0);
    assert_eq!(ctx.workflows.instances().await.len(), 1);
    assert_eq!(case.get_value("groups"), Some(&json!(["g-vip"])));
}

#[tokio::test]
async fn test_failing_action_does_not_stop_siblings() {
    let ctx = TestContext::new().await;
    let workflow = WorkflowDefinition::new(ACCOUNT, "Notify", "case").on(WorkflowEvent::Update);
    let hook = Action::webhook("").in_workflow(ACCOUNT, &workflow.id).with_id("a-hook");
    let after_hook = Action::update_field("notes", "hook delivered").child_of(&hook);
    let bump = Action::update_field("priority", 1).in_workflow(ACCOUNT, &workflow.id);
    ctx.workflows.add_workflow(workflow).await;
    ctx.workflows.add_action(hook).await;
    ctx.workflows.add_action(after_hook).await;
    ctx.workflows.add_action(bump).await;

    let mut case = ctx.saved_case("E1").await;
    let report = ctx
        .service()
        .run_workflows_on_event(&mut case, WorkflowEvent::Update, &ctx.user)
        .await
        .unwrap();

    assert_eq!(report.actions_halted, 1);
    assert_eq!(report.actions_continued, 1);
    assert_eq!(report.errors, vec!["a-hook: No url was provided for the webhook".to_string()]);
    assert_eq!(case.get_value("notes"), None);
    assert_eq!(case.get_value("priority"), Some(&json!(1)));
}

#[tokio::test]
async fn test_save_failure_is_reported_and_chain_goes_on() {
    let ctx = TestContext::new().await;
    let workflow = WorkflowDefinition::new(ACCOUNT, "Close", "case").on(WorkflowEvent::Update);
    let close = Action::update_field("status", "closed").in_workflow(ACCOUNT, &workflow.id);
    let mail = Action::send_email("desk@example.com", "Case <%title%>", "Status: <%status%>")
        .in_workflow(ACCOUNT, &workflow.id);
    ctx.workflows.add_workflow(workflow).await;
    ctx.workflows.add_action(close).await;
    ctx.workflows.add_action(mail).await;

    let mut case = ctx.saved_case("E1").await;
    ctx.entity_store.set_fail_saves(true);
    let report = ctx
        .service()
        .run_workflows_on_event(&mut case, WorkflowEvent::Update, &ctx.user)
        .await
        .unwrap();

    assert_eq!(report.actions_failed, 1);
    assert_eq!(report.actions_continued, 1);
    let sent = ctx.mail.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Case Printer jammed");
}

#[tokio::test]
async fn test_condition_branches_on_current_values() {
    let ctx = TestContext::new().await;
    let workflow = WorkflowDefinition::new(ACCOUNT, "Priority routing", "case").on(WorkflowEvent::Update);
    let urgent = Action::check_condition(vec![Condition::greater_than("priority", 3.0)])
        .in_workflow(ACCOUNT, &workflow.id);
    let flag_urgent = Action::update_field("notes", "urgent").child_of(&urgent);
    let routine = Action::check_condition(vec![Condition::equals("priority", 2)])
        .in_workflow(ACCOUNT, &workflow.id);
    let flag_routine = Action::update_field("notes", "routine").child_of(&routine);
    for action in [urgent, flag_urgent, routine, flag_routine] {
        ctx.workflows.add_action(action).await;
    }
    ctx.workflows.add_workflow(workflow).await;

    let mut case = ctx.saved_case("E1").await;
    let report = ctx
        .service()
        .run_workflows_on_event(&mut case, WorkflowEvent::Update, &ctx.user)
        .await
        .unwrap();

    assert_eq!(report.actions_halted, 1);
    assert_eq!(case.get_value_text("notes"), "routine");
}
