// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use storefront_core::{ContextData, Pipeline, PipelineControl, PipelineResult, ShopError, Workflows};

#[tokio::test]
async fn runs_steps_in_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext>::new("ordered", &[("step1", false, None), ("step2", false, None), ("step3", false, None)]);
  pipeline.on("step1", record_step("step1"));
  pipeline.on("step2", record_step("step2"));
  pipeline.on("step3", record_step("step3"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(result, PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.steps_executed, vec!["step1", "step2", "step3"]);
}

#[tokio::test]
async fn before_on_after_run_in_phase_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext>::new("phases", &[("only", false, None)]);
  pipeline.after("only", record_step("after"));
  pipeline.on("only", record_step("on"));
  pipeline.before("only", record_step("before"));

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().steps_executed, vec!["before", "on", "after"]);
}

#[tokio::test]
async fn stop_halts_remaining_steps() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext>::new("stopping", &[("a", false, None), ("b", false, None), ("c", false, None)]);
  pipeline.on("a", record_step("a"));
  pipeline.on("b", record_step("b"));
  pipeline.after("b", record_step("b_after"));
  pipeline.on("c", record_step("c"));

  let ctx = ContextData::new(TestContext {
    should_stop_at: Some("b".to_string()),
    ..Default::default()
  });
  let result = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(result, PipelineResult::Stopped);
  assert_eq!(ctx.read().steps_executed, vec!["a", "b"]);
}

#[tokio::test]
async fn handler_error_is_returned_unchanged() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext>::new("failing", &[("good", false, None), ("bad", false, None), ("never", false, None)]);
  pipeline.on("good", record_step("good"));
  pipeline.on("bad", failing_step("bad"));
  pipeline.on("never", record_step("never"));

  let ctx = ContextData::new(TestContext::default());
  let err = pipeline.run(ctx.clone()).await.unwrap_err();

  assert!(matches!(err, ShopError::Validation(ref m) if m == "bad failed"));
  assert_eq!(ctx.read().steps_executed, vec!["good", "bad"]);
}

#[tokio::test]
async fn skip_condition_is_evaluated_at_run_time() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext>::new("skipping", &[("set_flag", false, None), ("guarded", false, None), ("last", false, None)]);
  pipeline.on("set_flag", |ctx: ContextData<TestContext>| async move {
    ctx.write().flag = true;
    Ok::<_, ShopError>(PipelineControl::Continue)
  });
  pipeline.on("guarded", record_step("guarded"));
  pipeline.on("last", record_step("last"));
  pipeline.skip_if("guarded", |ctx: ContextData<TestContext>| ctx.read().flag);

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().steps_executed, vec!["last"]);
}

#[tokio::test]
async fn optional_step_without_handlers_is_passed_over() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext>::new("optional", &[("first", false, None), ("maybe", true, None), ("last", false, None)]);
  pipeline.on("first", record_step("first"));
  pipeline.on("last", record_step("last"));

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["first", "last"]);
}

#[tokio::test]
async fn required_step_without_handlers_fails() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext>::new("incomplete", &[("first", false, None), ("required", false, None)]);
  pipeline.on("first", record_step("first"));

  let err = pipeline.run(ContextData::new(TestContext::default())).await.unwrap_err();
  assert!(matches!(err, ShopError::HandlerMissing { ref step_name } if step_name == "required"));
}

#[test]
#[should_panic(expected = "has no step named")]
fn registering_on_unknown_step_panics() {
  let mut pipeline = Pipeline::<TestContext>::new("typo", &[("real", false, None)]);
  pipeline.on("reel", record_step("reel"));
}

#[tokio::test]
async fn registry_dispatches_by_context_type() {
  setup_tracing();
  let workflows = Workflows::new();
  assert!(!workflows.is_registered::<TestContext>());

  let err = workflows.run(ContextData::new(TestContext::default())).await.unwrap_err();
  assert!(matches!(err, ShopError::WorkflowNotRegistered { .. }));

  let mut pipeline = Pipeline::<TestContext>::new("registered", &[("only", false, None)]);
  pipeline.on("only", record_step("only"));
  workflows.register(pipeline);

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(workflows.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(ctx.read().counter, 1);
}

#[test]
fn standard_workflows_register_every_flow() {
  let workflows = storefront_core::standard_workflows();
  assert!(workflows.is_registered::<storefront_core::workflow::OrderCtxData>());
  assert!(workflows.is_registered::<storefront_core::workflow::SignupCtxData>());
  assert!(workflows.is_registered::<storefront_core::workflow::SigninCtxData>());
}

#[test]
fn order_pipeline_declares_its_steps() {
  let pipeline = storefront_core::workflow::order_pipeline::order_pipeline();
  assert_eq!(
    pipeline.step_names(),
    vec![
      "validate_request",
      "begin_transaction",
      "load_order",
      "check_modifiable",
      "apply_status",
      "lock_products",
      "restore_order_items",
      "process_order",
      "load_result",
      "commit_transaction",
    ]
  );
}
