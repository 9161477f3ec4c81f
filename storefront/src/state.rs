// storefront/src/state.rs
use std::sync::Arc;

use storefront_flow::FlowRegistry;

use crate::config::AppConfig;
use crate::db::Repositories;
use crate::errors::AppError;
use crate::pipelines;
use crate::services::image_store::ImageStore;
use crate::services::payment::PaymentGateway;

#[derive(Clone)]
pub struct AppState {
  pub repos: Repositories,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub payments: Arc<dyn PaymentGateway>,
  pub images: Arc<ImageStore>,
}

impl AppState {
  /// Wires the shared services and registers every pipeline.
  pub fn new(config: Arc<AppConfig>, repos: Repositories, payments: Arc<dyn PaymentGateway>) -> Self {
    let flows = Arc::new(FlowRegistry::<AppError>::new());
    pipelines::register_all_pipelines(&flows);
    let images = Arc::new(ImageStore::new(config.upload_dir.clone()));
    Self {
      repos,
      flows,
      config,
      payments,
      images,
    }
  }
}
