// storefront/src/services/session_identity.rs

//! Anonymous shopper identity and the cached cart badge count, both kept in
//! the signed session cookie.

use actix_session::Session;
use uuid::Uuid;

use crate::errors::Result;

pub const CUSTOMER_ID_KEY: &str = "CustomerId";
pub const ITEM_COUNT_KEY: &str = "ItemCount";

/// Returns the session's cart identity, minting and storing a fresh one on
/// first use.
pub fn get_or_create_customer_id(session: &Session) -> Result<String> {
  if let Some(existing) = current_customer_id(session)? {
    return Ok(existing);
  }
  let minted = Uuid::new_v4().to_string();
  session.insert(CUSTOMER_ID_KEY, &minted)?;
  tracing::debug!(customer_session = %minted, "Minted cart identity");
  Ok(minted)
}

pub fn current_customer_id(session: &Session) -> Result<Option<String>> {
  Ok(session.get::<String>(CUSTOMER_ID_KEY)?.filter(|id| !id.is_empty()))
}

pub fn set_item_count(session: &Session, count: i64) -> Result<()> {
  session.insert(ITEM_COUNT_KEY, count)?;
  Ok(())
}

pub fn item_count(session: &Session) -> Result<i64> {
  Ok(session.get::<i64>(ITEM_COUNT_KEY)?.unwrap_or(0))
}
