// storefront/src/main.rs

use std::sync::Arc;

use actix_web::{cookie::Key, HttpServer};
use sqlx::postgres::PgPoolOptions;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

use storefront::db::{seed, Repositories};
use storefront::services::payment::build_gateway;
use storefront::web::build_app;
use storefront::{AppConfig, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting storefront server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
    }
  };

  let db_pool = match PgPoolOptions::new()
    .max_connections(10)
    .connect(&app_config.database_url)
    .await
  {
    Ok(pool) => {
      tracing::info!("Successfully connected to the database.");
      pool
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      return Err(std::io::Error::other(e));
    }
  };

  if app_config.run_migrations {
    if let Err(e) = sqlx::migrate!("./migrations").run(&db_pool).await {
      tracing::error!(error = %e, "Database migration failed.");
      return Err(std::io::Error::other(e));
    }
    tracing::info!("Database migrations applied.");
  }

  let repos = Repositories::postgres(db_pool.clone());
  if app_config.seed_db {
    if let Err(e) = seed::seed_catalog(&repos).await {
      tracing::error!(error = %e, "Failed to seed database.");
    }
  }

  let payments = match build_gateway(&app_config) {
    Ok(gateway) => gateway,
    Err(e) => {
      tracing::error!(error = %e, "Failed to build payment gateway.");
      return Err(std::io::Error::other(e.to_string()));
    }
  };

  let app_state = AppState::new(app_config.clone(), repos, payments);
  if let Err(e) = app_state.images.ensure_dir().await {
    tracing::error!(error = %e, "Upload directory is not writable.");
    return Err(std::io::Error::other(e.to_string()));
  }

  let session_key = Key::from(app_config.session_key.as_bytes());
  let cookie_secure = app_config.cookie_secure;

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || build_app(app_state.clone(), session_key.clone(), cookie_secure))
    .bind(&server_address)?
    .run()
    .await
}
