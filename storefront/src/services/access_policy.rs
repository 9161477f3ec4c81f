// storefront/src/services/access_policy.rs

use crate::errors::{AppError, Result};
use crate::models::Order;
use crate::web::extractors::Principal;

pub const ADMINISTRATOR_ROLE: &str = "Administrator";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
  Authenticated,
  Administrator,
}

/// Gate run at the top of every protected handler. Missing identity is 401;
/// an identity without the required role is 403.
pub fn authorize(principal: Option<&Principal>, requirement: Requirement) -> Result<&Principal> {
  let principal = principal.ok_or(AppError::Unauthenticated)?;
  match requirement {
    Requirement::Authenticated => Ok(principal),
    Requirement::Administrator if principal.is_admin() => Ok(principal),
    Requirement::Administrator => {
      tracing::warn!(user = %principal.name, "Administrator role required");
      Err(AppError::Forbidden("Administrator role required.".to_string()))
    }
  }
}

pub fn can_view_order(principal: &Principal, order: &Order) -> bool {
  principal.is_admin() || order.customer_id == principal.name
}
