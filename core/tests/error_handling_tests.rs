// tests/error_handling_tests.rs
mod common;

use common::*;
use serial_test::serial;
use storefront_flow::{ContextData, FlowError, Pipeline, PipelineControl};

#[tokio::test]
#[serial]
async fn required_step_without_handlers_fails() {
  setup_tracing();
  let pipeline = Pipeline::<TestCheckout, TestError>::new(&[("persist_order", false, None)]);
  let ctx = ContextData::new(TestCheckout::default());

  match pipeline.run(ctx).await {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("persist_order"));
    }
    other => panic!("expected HandlerMissing, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn pipeline_can_use_flow_error_directly() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestCheckout, FlowError>::new(&[("task", false, None)]);
  pipeline.on_root("task", |_ctx: ContextData<TestCheckout>| async move {
    Err::<PipelineControl, _>(FlowError::Internal("draft vanished".to_string()))
  });

  let err = pipeline.run(ContextData::new(TestCheckout::default())).await.unwrap_err();
  assert!(matches!(err, FlowError::Internal(ref m) if m == "draft vanished"));
}

#[tokio::test]
#[serial]
async fn anyhow_errors_become_handler_errors() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestCheckout, FlowError>::new(&[("task", false, None)]);
  pipeline.on_root("task", |_ctx: ContextData<TestCheckout>| async move {
    Err::<PipelineControl, _>(anyhow::anyhow!("gateway timed out"))
  });

  let err = pipeline.run(ContextData::new(TestCheckout::default())).await.unwrap_err();
  match err {
    FlowError::HandlerError { source } => assert_eq!(source.to_string(), "gateway timed out"),
    other => panic!("expected HandlerError, got {:?}", other),
  }
}
