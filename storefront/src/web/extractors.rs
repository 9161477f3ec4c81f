// storefront/src/web/extractors.rs

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::debug;

use crate::errors::AppError;
use crate::services::access_policy::ADMINISTRATOR_ROLE;

/// Header carrying the authenticated user name, set by the fronting identity
/// provider.
pub const USER_HEADER: &str = "X-Auth-User";
/// Comma-separated role names for the user in `USER_HEADER`.
pub const ROLES_HEADER: &str = "X-Auth-Roles";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
  pub name: String,
  pub roles: Vec<String>,
}

impl Principal {
  pub fn is_admin(&self) -> bool {
    self.roles.iter().any(|r| r == ADMINISTRATOR_ROLE)
  }

  fn from_headers(req: &HttpRequest) -> Option<Self> {
    let name = req
      .headers()
      .get(USER_HEADER)
      .and_then(|v| v.to_str().ok())
      .map(str::trim)
      .filter(|v| !v.is_empty())?
      .to_string();
    let roles = req
      .headers()
      .get(ROLES_HEADER)
      .and_then(|v| v.to_str().ok())
      .map(|raw| {
        raw
          .split(',')
          .map(str::trim)
          .filter(|r| !r.is_empty())
          .map(String::from)
          .collect()
      })
      .unwrap_or_default();
    Some(Self { name, roles })
  }
}

// Handlers take `Option<Principal>` and run it through `authorize`, so a
// missing identity becomes a policy decision rather than an extractor error.
impl FromRequest for Principal {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    match Self::from_headers(req) {
      Some(principal) => ready(Ok(principal)),
      None => {
        debug!("Principal extractor: no {} header.", USER_HEADER);
        ready(Err(AppError::Unauthenticated))
      }
    }
  }
}
