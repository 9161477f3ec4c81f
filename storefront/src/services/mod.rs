// storefront/src/services/mod.rs

pub mod access_policy;
pub mod image_store;
pub mod payment;
pub mod payment_mock;
pub mod payment_stripe;
pub mod session_identity;
