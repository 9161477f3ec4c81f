// storefront/src/lib.rs

//! Online clothing storefront: catalog browsing, a session cart, checkout
//! through a hosted payment page, order history and catalog administration.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod web;

pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use state::AppState;
