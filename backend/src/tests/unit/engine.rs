// Unit tests for the workflow service's dispatch rules

use serde_json::json;

use crate::tests::fixtures::ACCOUNT;
use crate::tests::helpers::TestContext;
use crate::workflows::{
    Action, ActionType, ExecutionReport, WorkflowDefinition, WorkflowEvent,
};

async fn workflow_on(ctx: &TestContext, id: &str, event: WorkflowEvent) -> WorkflowDefinition {
    let workflow = WorkflowDefinition::new(ACCOUNT, "Case triage", "case")
        .with_id(id)
        .on(event);
    ctx.workflows.add_workflow(workflow.clone()).await;
    workflow
}

#[test]
fn test_report_merge_adds_counters() {
    let mut total = ExecutionReport {
        workflows_started: 1,
        actions_executed: 2,
        actions_continued: 2,
        ..Default::default()
    };
    total.merge(ExecutionReport {
        actions_executed: 1,
        actions_halted: 1,
        actions_failed: 1,
        errors: vec!["a1: boom".to_string()],
        ..Default::default()
    });

    assert_eq!(total.workflows_started, 1);
    assert_eq!(total.actions_executed, 3);
    assert_eq!(total.actions_continued, 2);
    assert_eq!(total.actions_halted, 1);
    assert_eq!(total.actions_failed, 1);
    assert_eq!(total.errors, vec!["a1: boom".to_string()]);
}

#[test]
fn test_definition_listens_only_to_flagged_events() {
    let workflow = WorkflowDefinition::new(ACCOUNT, "On save", "case")
        .on(WorkflowEvent::Create)
        .on(WorkflowEvent::Update);

    assert!(workflow.listens_to(WorkflowEvent::Create));
    assert!(workflow.listens_to(WorkflowEvent::Update));
    assert!(!workflow.listens_to(WorkflowEvent::Delete));
}

#[tokio::test]
async fn test_unsaved_entity_starts_nothing() {
    let ctx = TestContext::new().await;
    let workflow = workflow_on(&ctx, "wf-1", WorkflowEvent::Create).await;
    ctx.workflows
        .add_action(Action::update_field("status", "triaged").in_workflow(ACCOUNT, &workflow.id))
        .await;

    let mut case = ctx.unsaved_case();
    let report = ctx
        .service()
        .run_workflows_on_event(&mut case, WorkflowEvent::Create, &ctx.user)
        .await
        .unwrap();

    assert_eq!(report, ExecutionReport::default());
    assert!(ctx.workflows.instances().await.is_empty());
}

#[tokio::test]
async fn test_other_events_and_inactive_workflows_are_ignored() {
    let ctx = TestContext::new().await;
    let on_delete = workflow_on(&ctx, "wf-delete", WorkflowEvent::Delete).await;
    ctx.workflows
        .add_action(Action::update_field("status", "gone").in_workflow(ACCOUNT, &on_delete.id))
        .await;
    let inactive = WorkflowDefinition::new(ACCOUNT, "Disabled", "case")
        .on(WorkflowEvent::Update)
        .inactive();
    ctx.workflows.add_workflow(inactive).await;

    let mut case = ctx.saved_case("E1").await;
    let report = ctx
        .service()
        .run_workflows_on_event(&mut case, WorkflowEvent::Update, &ctx.user)
        .await
        .unwrap();

    assert_eq!(report.workflows_started, 0);
    assert_eq!(case.get_value("status"), Some(&json!("open")));
}

#[tokio::test]
async fn test_unknown_action_type_counts_as_failed() {
    let ctx = TestContext::new().await;
    let workflow = workflow_on(&ctx, "wf-1", WorkflowEvent::Create).await;
    let bogus = Action::with_kind("teleport").in_workflow(ACCOUNT, &workflow.id);
    let child = Action::update_field("status", "never").child_of(&bogus);
    ctx.workflows.add_action(bogus).await;
    ctx.workflows.add_action(child).await;

    let mut case = ctx.saved_case("E1").await;
    let report = ctx
        .service()
        .run_workflows_on_event(&mut case, WorkflowEvent::Create, &ctx.user)
        .await
        .unwrap();

    assert_eq!(report.workflows_started, 1);
    assert_eq!(report.actions_executed, 0);
    assert_eq!(report.actions_failed, 1);
    assert!(report.errors[0].contains("teleport"));
    assert!(report.errors[0].contains("[ACTION_NOT_FOUND]"));
    assert_eq!(case.get_value("status"), Some(&json!("open")));
}

#[tokio::test]
async fn test_halted_action_skips_its_children_only() {
    let ctx = TestContext::new().await;
    let workflow = workflow_on(&ctx, "wf-1", WorkflowEvent::Update).await;

    let gate = Action::new(ActionType::CheckCondition)
        .with_param("conditions", json!([{"field": "status", "operator": "equals", "value": "closed"}]))
        .in_workflow(ACCOUNT, &workflow.id);
    let behind_gate = Action::update_field("notes", "closed follow-up").child_of(&gate);
    let sibling = Action::update_field("priority", 5).in_workflow(ACCOUNT, &workflow.id);
    ctx.workflows.add_action(gate).await;
    ctx.workflows.add_action(behind_gate).await;
    ctx.workflows.add_action(sibling).await;

    let mut case = ctx.saved_case("E1").await;
    let report = ctx
        .service()
        .run_workflows_on_event(&mut case, WorkflowEvent::Update, &ctx.user)
        .await
        .unwrap();

    assert_eq!(report.actions_executed, 2);
    assert_eq!(report.actions_halted, 1);
    assert_eq!(report.actions_continued, 1);
    assert!(report.errors.is_empty());
    assert_eq!(case.get_value("notes"), None);
    assert_eq!(case.get_value("priority"), Some(&json!(5)));
}

#[tokio::test]
async fn test_run_child_actions_skips_the_parent() {
    let ctx = TestContext::new().await;
    let workflow = workflow_on(&ctx, "wf-1", WorkflowEvent::Update).await;
    let parent = Action::update_field("status", "parent ran").in_workflow(ACCOUNT, &workflow.id);
    let child = Action::update_field("notes", "child ran").child_of(&parent);
    ctx.workflows.add_action(parent.clone()).await;
    ctx.workflows.add_action(child).await;

    let mut case = ctx.saved_case("E1").await;
    let report = ctx
        .service()
        .run_child_actions(&parent, &mut case, &ctx.user)
        .await
        .unwrap();

    assert_eq!(report.actions_executed, 1);
    assert_eq!(case.get_value("status"), Some(&json!("open")));
    assert_eq!(case.get_value("notes"), Some(&json!("child ran")));
}
