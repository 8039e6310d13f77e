use bson::{doc, DateTime, Document};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{parse_object_id, Collection, DocumentStore, InsertResult};
use crate::error::BackendError;
use crate::resp::problem::{problems, Problem};

/// A completed purchase as reported by the client after the provider confirmed the charge.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    #[schema(example = "64b7f0c2a1b2c3d4e5f60718")]
    pub class_id: String,
    pub transaction_id: String,
    pub price: f64,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Document,
}

impl NewPayment {
    pub fn validate(&self) -> Result<(), Problem> {
        parse_object_id(&self.class_id).map_err(|_| problems::bad_object_id(&self.class_id))?;

        if self.transaction_id.trim().is_empty() {
            return Err(problems::bad_request("Transaction id must not be empty."));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(problems::bad_request(
                "Payment price must be a non-negative number.",
            ));
        }
        Ok(())
    }

    /// Stored form: the payer's email and the server's timestamp override anything sent.
    pub fn into_document(self, email: &str) -> Result<Document, BackendError> {
        let mut document = bson::to_document(&self)?;
        document.insert("email", email);
        document.insert("date", DateTime::now());
        Ok(document)
    }
}

#[rocket::async_trait]
pub trait PaymentDbExt {
    async fn record_payment(
        &self,
        email: &str,
        payment: NewPayment,
    ) -> Result<InsertResult, BackendError>;
    async fn payments_for(&self, email: &str) -> Result<Vec<Document>, BackendError>;
}

#[rocket::async_trait]
impl<S: DocumentStore + ?Sized> PaymentDbExt for S {
    async fn record_payment(
        &self,
        email: &str,
        payment: NewPayment,
    ) -> Result<InsertResult, BackendError> {
        self.insert(Collection::Payments, payment.into_document(email)?)
            .await
    }

    async fn payments_for(&self, email: &str) -> Result<Vec<Document>, BackendError> {
        self.find(Collection::Payments, doc! { "email": email })
            .await
    }
}
