// storefront/src/services/payment_mock.rs
use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result as AppResult};
use crate::services::payment::{CheckoutSessionRequest, PaymentGateway, PaymentSession, PaymentSessionStatus};

#[derive(Debug, Clone)]
struct MockSession {
  amount_minor: i64,
  currency: String,
  paid: bool,
}

/// In-process stand-in for the hosted payment provider. With `auto_confirm`
/// every session reports paid as soon as it is created; otherwise a test marks
/// sessions paid explicitly.
pub struct MockGateway {
  auto_confirm: bool,
  unavailable: bool,
  sessions: Mutex<HashMap<String, MockSession>>,
}

impl MockGateway {
  pub fn new(auto_confirm: bool) -> Self {
    Self {
      auto_confirm,
      unavailable: false,
      sessions: Mutex::new(HashMap::new()),
    }
  }

  /// A provider that rejects every session creation.
  pub fn failing() -> Self {
    Self {
      unavailable: true,
      ..Self::new(false)
    }
  }

  /// Simulates the buyer completing the hosted checkout.
  pub fn mark_paid(&self, session_id: &str) -> bool {
    match self.sessions.lock().get_mut(session_id) {
      Some(session) => {
        session.paid = true;
        true
      }
      None => false,
    }
  }

  pub fn session_ids(&self) -> Vec<String> {
    self.sessions.lock().keys().cloned().collect()
  }
}

#[async_trait]
impl PaymentGateway for MockGateway {
  fn publishable_key(&self) -> &str {
    "pk_mock"
  }

  #[instrument(name = "payment_mock::create_session", skip(self, request), fields(amount = request.amount_minor, currency = %request.currency))]
  async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> AppResult<PaymentSession> {
    if self.unavailable {
      return Err(AppError::Payment("Payment provider is unavailable".to_string()));
    }
    if request.amount_minor <= 0 {
      return Err(AppError::Payment("Amount must be greater than zero".to_string()));
    }
    let id = format!("cs_mock_{}", Uuid::new_v4().simple());
    self.sessions.lock().insert(
      id.clone(),
      MockSession {
        amount_minor: request.amount_minor,
        currency: request.currency.clone(),
        paid: self.auto_confirm,
      },
    );
    info!(session_id = %id, "Simulated creation of hosted checkout session");
    Ok(PaymentSession { id })
  }

  #[instrument(name = "payment_mock::retrieve_session", skip(self))]
  async fn retrieve_session(&self, session_id: &str) -> AppResult<PaymentSessionStatus> {
    let sessions = self.sessions.lock();
    let session = sessions
      .get(session_id)
      .ok_or_else(|| AppError::Payment(format!("Unknown payment session '{}'", session_id)))?;
    Ok(PaymentSessionStatus {
      id: session_id.to_string(),
      paid: session.paid,
      amount_total: Some(session.amount_minor),
      currency: Some(session.currency.clone()),
    })
  }
}
