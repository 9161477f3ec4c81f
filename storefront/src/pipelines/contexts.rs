// storefront/src/pipelines/contexts.rs

//! Underlying data structs used by the storefront pipelines. Handlers receive
//! these wrapped in `storefront_flow::ContextData`.

use rust_decimal::Decimal;

use crate::models::{CartLine, CheckoutDraft, Order, ShippingAddress};
use crate::services::payment::PaymentSession;
use crate::state::AppState;

#[derive(Clone)]
pub struct AddToCartCtxData {
  pub app_state: AppState,
  pub customer_session: String,
  pub product_id: i64,
  pub quantity: i32,
  pub unit_price: Option<Decimal>,
  pub cart_line: Option<CartLine>,
}

/// Checkout form submission: validates the address, totals the cart and
/// stores the pending order header server-side.
#[derive(Clone)]
pub struct CheckoutDraftCtxData {
  pub app_state: AppState,
  pub customer_session: String,
  pub customer_id: String,
  pub shipping: ShippingAddress,
  pub cart_total: Option<Decimal>,
  pub draft: Option<CheckoutDraft>,
}

#[derive(Clone)]
pub struct PaymentSessionCtxData {
  pub app_state: AppState,
  pub customer_session: String,
  pub customer_id: String,
  pub draft: Option<CheckoutDraft>,
  pub payment_session: Option<PaymentSession>,
}

/// Success redirect from the payment provider.
#[derive(Clone)]
pub struct ConfirmOrderCtxData {
  pub app_state: AppState,
  pub customer_session: String,
  pub customer_id: String,
  pub returned_session_id: Option<String>,
  pub draft: Option<CheckoutDraft>,
  pub order: Option<Order>,
}
