// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use serial_test::serial;
use std::sync::Arc;
use storefront_flow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult};

fn three_step_pipeline() -> Pipeline<TestCheckout, TestError> {
  let mut pipeline = Pipeline::<TestCheckout, TestError>::new(&[
    ("load_cart", false, None),
    ("compute_total", false, None),
    ("store_draft", false, None),
  ]);
  pipeline.on_root("load_cart", recording_handler("load_cart", 0));
  pipeline.on_root("compute_total", recording_handler("compute_total", 2500));
  pipeline.on_root("store_draft", recording_handler("store_draft", 0));
  pipeline
}

#[tokio::test]
#[serial]
async fn steps_run_in_declaration_order() {
  setup_tracing();
  let pipeline = three_step_pipeline();
  let ctx = ContextData::new(TestCheckout::default());

  let result = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(result, PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.trail, vec!["load_cart", "compute_total", "store_draft"]);
  assert_eq!(guard.total_cents, 2500);
}

#[tokio::test]
#[serial]
async fn stop_halts_the_run_and_names_the_step() {
  setup_tracing();
  let pipeline = three_step_pipeline();
  let ctx = ContextData::new(TestCheckout {
    stop_at: Some("compute_total".to_string()),
    ..Default::default()
  });

  let result = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(
    result,
    PipelineResult::Stopped {
      step: "compute_total".to_string()
    }
  );
  assert!(!result.is_completed());
  assert_eq!(ctx.read().trail, vec!["load_cart", "compute_total"]);
}

#[tokio::test]
#[serial]
async fn handler_error_propagates_and_later_steps_do_not_run() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestCheckout, TestError>::new(&[
    ("load_draft", false, None),
    ("verify_payment", false, None),
    ("persist_order", false, None),
  ]);
  pipeline.on_root("load_draft", recording_handler("load_draft", 0));
  pipeline.on_root("verify_payment", failing_handler("verify_payment", "not paid"));
  pipeline.on_root("persist_order", recording_handler("persist_order", 0));

  let ctx = ContextData::new(TestCheckout::default());
  let err = pipeline.run(ctx.clone()).await.unwrap_err();

  assert_eq!(err, TestError::Handler("not paid".to_string()));
  assert_eq!(ctx.read().trail, vec!["load_draft", "verify_payment"]);
}

#[tokio::test]
#[serial]
async fn skip_condition_is_evaluated_against_current_context() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestCheckout, TestError>::new(&[
    ("charge", false, None),
    (
      "charge_again",
      false,
      Some(Arc::new(|ctx: ContextData<TestCheckout>| ctx.read().paid)),
    ),
  ]);
  pipeline.on_root("charge", |ctx: ContextData<TestCheckout>| async move {
    let mut guard = ctx.write();
    guard.trail.push("charge".to_string());
    guard.paid = true;
    Ok::<_, TestError>(PipelineControl::Continue)
  });
  pipeline.on_root("charge_again", recording_handler("charge_again", 0));

  let ctx = ContextData::new(TestCheckout::default());
  let result = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(result, PipelineResult::Completed);
  assert_eq!(ctx.read().trail, vec!["charge"]);
}

#[tokio::test]
#[serial]
async fn set_skip_condition_rejects_unknown_steps() {
  let mut pipeline = three_step_pipeline();
  let err = pipeline.set_skip_condition("nope", None).unwrap_err();
  assert!(matches!(err, FlowError::StepNotFound { step_name } if step_name == "nope"));

  pipeline
    .set_skip_condition("store_draft", Some(Arc::new(|_ctx: ContextData<TestCheckout>| true)))
    .unwrap();
  let ctx = ContextData::new(TestCheckout::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().trail, vec!["load_cart", "compute_total"]);
}

#[tokio::test]
#[serial]
async fn before_on_after_phases_run_in_order_within_a_step() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestCheckout, TestError>::new(&[("persist", false, None)]);
  pipeline.after_root("persist", recording_handler("after", 0));
  pipeline.on_root("persist", recording_handler("on", 0));
  pipeline.before_root("persist", recording_handler("before", 0));

  let ctx = ContextData::new(TestCheckout::default());
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().trail, vec!["before", "on", "after"]);
}

#[tokio::test]
#[serial]
async fn optional_step_without_handlers_is_skipped() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestCheckout, TestError>::new(&[
    ("notify", true, None),
    ("persist", false, None),
  ]);
  pipeline.on_root("persist", recording_handler("persist", 0));

  let ctx = ContextData::new(TestCheckout::default());
  let result = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(result, PipelineResult::Completed);
  assert_eq!(ctx.read().trail, vec!["persist"]);
}

#[test]
#[should_panic(expected = "not defined")]
fn registering_on_an_unknown_step_panics() {
  let mut pipeline = Pipeline::<TestCheckout, TestError>::new(&[("known", false, None)]);
  pipeline.on_root("unknown", recording_handler("unknown", 0));
}
