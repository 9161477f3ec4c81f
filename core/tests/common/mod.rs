// tests/common/mod.rs
#![allow(dead_code)]

use storefront_flow::{ContextData, FlowError, Handler, PipelineControl};
use tracing::Level;

/// A toy checkout context: every step appends its name to `trail`.
#[derive(Clone, Debug, Default)]
pub struct TestCheckout {
  pub trail: Vec<String>,
  pub total_cents: i64,
  pub stop_at: Option<String>,
  pub paid: bool,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("flow error: {0}")]
  Flow(String),

  #[error("handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(err: FlowError) -> Self {
    TestError::Flow(format!("{:?}", err))
  }
}

/// Records `step` in the trail, adds `cents` to the total, and stops if asked to.
pub fn recording_handler(step: &'static str, cents: i64) -> Handler<TestCheckout, TestError> {
  Box::new(move |ctx: ContextData<TestCheckout>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.trail.push(step.to_string());
      guard.total_cents += cents;
      if guard.stop_at.as_deref() == Some(step) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn failing_handler(step: &'static str, message: &'static str) -> Handler<TestCheckout, TestError> {
  Box::new(move |ctx: ContextData<TestCheckout>| {
    Box::pin(async move {
      ctx.write().trail.push(step.to_string());
      Err(TestError::Handler(message.to_string()))
    })
  })
}

use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
