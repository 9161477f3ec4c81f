// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Minimum length of `SESSION_KEY`, the signing/encryption master key for the
/// session cookie.
pub const MIN_SESSION_KEY_BYTES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProvider {
  Stripe,
  Mock,
}

impl FromStr for PaymentProvider {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "stripe" => Ok(PaymentProvider::Stripe),
      "mock" => Ok(PaymentProvider::Mock),
      other => Err(AppError::Config(format!("Unknown PAYMENT_PROVIDER '{}'", other))),
    }
  }
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub app_base_url: String,
  pub store_name: String,

  pub payment_provider: PaymentProvider,
  pub stripe_publishable_key: String,
  pub stripe_secret_key: String,
  pub stripe_api_base: String,
  pub payment_currency: String,
  pub payment_timeout_secs: u64,
  pub mock_payment_auto_confirm: bool,

  pub session_key: String,
  pub cookie_secure: bool,
  pub checkout_draft_ttl_minutes: i64,

  pub upload_dir: PathBuf,
  pub max_upload_bytes: usize,

  pub run_migrations: bool,
  pub seed_db: bool,
}

impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &"[REDACTED]")
      .field("app_base_url", &self.app_base_url)
      .field("store_name", &self.store_name)
      .field("payment_provider", &self.payment_provider)
      .field("stripe_api_base", &self.stripe_api_base)
      .field("payment_currency", &self.payment_currency)
      .field("mock_payment_auto_confirm", &self.mock_payment_auto_confirm)
      .field("cookie_secure", &self.cookie_secure)
      .field("upload_dir", &self.upload_dir)
      .field("max_upload_bytes", &self.max_upload_bytes)
      .finish_non_exhaustive()
  }
}

fn parse_var<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match raw {
    None => Ok(default),
    Some(v) => v
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, v, e))),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    let config = Self::from_lookup(|name| env::var(name).ok().filter(|v| !v.is_empty()))?;
    tracing::info!("Application configuration loaded successfully.");
    tracing::debug!(config = ?config, "Loaded config details");
    Ok(config)
  }

  /// Builds the configuration from any variable source, e.g. a map in tests.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let require =
      |name: &str| lookup(name).ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", name)));

    let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse_var("SERVER_PORT", lookup("SERVER_PORT"), 8080u16)?;
    let database_url = require("DATABASE_URL")?;
    let app_base_url = lookup("APP_BASE_URL")
      .unwrap_or_else(|| format!("http://{}:{}", server_host, server_port))
      .trim_end_matches('/')
      .to_string();
    let store_name = lookup("STORE_NAME").unwrap_or_else(|| "DotNetDuds".to_string());

    let payment_provider = parse_var("PAYMENT_PROVIDER", lookup("PAYMENT_PROVIDER"), PaymentProvider::Mock)?;
    let stripe_publishable_key = lookup("STRIPE_PUBLISHABLE_KEY").unwrap_or_default();
    let stripe_secret_key = lookup("STRIPE_SECRET_KEY").unwrap_or_default();
    if payment_provider == PaymentProvider::Stripe && (stripe_secret_key.is_empty() || stripe_publishable_key.is_empty()) {
      return Err(AppError::Config(
        "STRIPE_SECRET_KEY and STRIPE_PUBLISHABLE_KEY are required when PAYMENT_PROVIDER=stripe".to_string(),
      ));
    }
    let stripe_api_base = lookup("STRIPE_API_BASE")
      .unwrap_or_else(|| "https://api.stripe.com".to_string())
      .trim_end_matches('/')
      .to_string();
    let payment_currency = lookup("PAYMENT_CURRENCY").unwrap_or_else(|| "cad".to_string()).to_ascii_lowercase();
    let payment_timeout_secs = parse_var("PAYMENT_TIMEOUT_SECS", lookup("PAYMENT_TIMEOUT_SECS"), 15u64)?;
    let mock_payment_auto_confirm =
      parse_var("MOCK_PAYMENT_AUTO_CONFIRM", lookup("MOCK_PAYMENT_AUTO_CONFIRM"), false)?;

    let session_key = require("SESSION_KEY")?;
    if session_key.len() < MIN_SESSION_KEY_BYTES {
      return Err(AppError::Config(format!(
        "SESSION_KEY must be at least {} bytes long",
        MIN_SESSION_KEY_BYTES
      )));
    }
    let cookie_secure = parse_var("COOKIE_SECURE", lookup("COOKIE_SECURE"), true)?;
    // Auto-confirmed payments are for local development over plain HTTP only.
    if mock_payment_auto_confirm && (payment_provider != PaymentProvider::Mock || cookie_secure) {
      return Err(AppError::Config(
        "MOCK_PAYMENT_AUTO_CONFIRM=true requires PAYMENT_PROVIDER=mock and COOKIE_SECURE=false".to_string(),
      ));
    }
    let checkout_draft_ttl_minutes =
      parse_var("CHECKOUT_DRAFT_TTL_MINUTES", lookup("CHECKOUT_DRAFT_TTL_MINUTES"), 30i64)?;
    if checkout_draft_ttl_minutes <= 0 {
      return Err(AppError::Config("CHECKOUT_DRAFT_TTL_MINUTES must be positive".to_string()));
    }

    let upload_dir = PathBuf::from(lookup("UPLOAD_DIR").unwrap_or_else(|| "wwwroot/img/product-uploads".to_string()));
    let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", lookup("MAX_UPLOAD_BYTES"), 5 * 1024 * 1024usize)?;

    let run_migrations = parse_var("RUN_MIGRATIONS", lookup("RUN_MIGRATIONS"), true)?;
    let seed_db = parse_var("SEED_DB", lookup("SEED_DB"), false)?;

    Ok(Self {
      server_host,
      server_port,
      database_url,
      app_base_url,
      store_name,
      payment_provider,
      stripe_publishable_key,
      stripe_secret_key,
      stripe_api_base,
      payment_currency,
      payment_timeout_secs,
      mock_payment_auto_confirm,
      session_key,
      cookie_secure,
      checkout_draft_ttl_minutes,
      upload_dir,
      max_upload_bytes,
      run_migrations,
      seed_db,
    })
  }
}
