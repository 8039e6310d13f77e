//! Payment intents for class purchases.
//!
//! [`PaymentProvider`] is the seam to the external processor; [`stripe::StripeClient`] is the
//! production implementation.

use std::sync::Arc;

use bson::oid::ObjectId;
use thiserror::Error;

use crate::data::class::{price_of, ClassDbExt};
use crate::data::DocumentStore;
use crate::resp::problem::{problems, Problem};

pub mod stripe;

pub type Payments = Arc<dyn PaymentProvider>;

pub static DEFAULT_CURRENCY: &str = "usd";
pub static CARD_PAYMENT_METHOD: &str = "card";

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment provider unreachable: {0}")]
    Network(String),
    #[error("payment provider rejected request ({status}): {message}")]
    Provider { status: u16, message: String },
    #[error("unexpected payment provider response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntentRequest {
    /// Minor currency units (cents).
    pub amount: i64,
    pub currency: String,
    pub payment_method_types: Vec<String>,
}

impl PaymentIntentRequest {
    pub fn card_usd(amount: i64) -> PaymentIntentRequest {
        PaymentIntentRequest {
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
            payment_method_types: vec![CARD_PAYMENT_METHOD.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[rocket::async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError>;
}

/// Converts a class price in dollars to cents. Rejects negative and non-finite prices.
pub fn amount_in_cents(price: f64) -> Option<i64> {
    if !price.is_finite() || price < 0.0 {
        return None;
    }
    Some((price * 100.0).round() as i64)
}

/// Looks up the class, prices it and opens a card payment intent for it.
pub async fn create_class_payment_intent(
    store: &dyn DocumentStore,
    provider: &dyn PaymentProvider,
    class_id: ObjectId,
) -> Result<PaymentIntent, Problem> {
    let class = store
        .get_class(class_id)
        .await?
        .ok_or_else(|| problems::not_found("Class not found"))?;

    let amount = price_of(&class)
        .and_then(amount_in_cents)
        .ok_or_else(|| {
            tracing::warn!("class {} has no usable price", class_id);
            problems::internal("Class has no valid price")
        })?;

    tracing::info!("creating payment intent of {} cents for class {}", amount, class_id);
    let intent = provider
        .create_payment_intent(PaymentIntentRequest::card_usd(amount))
        .await?;

    Ok(intent)
}

#[cfg(test)]
pub mod mock {
    use std::sync::Mutex;

    use super::*;

    /// Records every request and answers with a deterministic secret.
    #[derive(Debug, Default)]
    pub struct MockPaymentProvider {
        pub requests: Mutex<Vec<PaymentIntentRequest>>,
        pub fail: bool,
    }

    impl MockPaymentProvider {
        pub fn failing() -> MockPaymentProvider {
            MockPaymentProvider {
                fail: true,
                ..Default::default()
            }
        }

        pub fn recorded(&self) -> Vec<PaymentIntentRequest> {
            self.requests.lock().expect("mock lock poisoned").clone()
        }
    }

    #[rocket::async_trait]
    impl PaymentProvider for MockPaymentProvider {
        async fn create_payment_intent(
            &self,
            request: PaymentIntentRequest,
        ) -> Result<PaymentIntent, PaymentError> {
            if self.fail {
                return Err(PaymentError::Provider {
                    status: 402,
                    message: "card_declined".to_string(),
                });
            }

            let amount = request.amount;
            self.requests.lock().expect("mock lock poisoned").push(request);
            Ok(PaymentIntent {
                id: format!("pi_mock_{}", amount),
                client_secret: format!("pi_mock_{}_secret", amount),
            })
        }
    }
}
