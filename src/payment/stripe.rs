//! Stripe implementation of [`PaymentProvider`].

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{PaymentError, PaymentIntent, PaymentIntentRequest, PaymentProvider};

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Clone)]
pub struct StripeClient {
    api_key: SecretString,
    api_base_url: String,
    http_client: reqwest::Client,
}

impl StripeClient {
    pub fn new(api_key: SecretString, api_base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }
}

/// Stripe takes form-encoded bodies with bracketed array keys.
fn form_params(request: &PaymentIntentRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("amount", request.amount.to_string()),
        ("currency", request.currency.clone()),
    ];
    for method in &request.payment_method_types {
        params.push(("payment_method_types[]", method.clone()));
    }
    params
}

/// Maps a `/v1/payment_intents` reply to an intent or a provider error.
fn parse_intent_response(status: u16, body: &str) -> Result<PaymentIntent, PaymentError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_str::<StripeErrorBody>(body)
            .map(|body| {
                let code = body.error.code.unwrap_or_default();
                let message = body.error.message.unwrap_or_default();
                format!("{} {}", code, message).trim().to_string()
            })
            .unwrap_or_else(|_| body.to_string());
        return Err(PaymentError::Provider { status, message });
    }

    let intent: StripePaymentIntent = serde_json::from_str(body)
        .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;
    let client_secret = intent.client_secret.ok_or_else(|| {
        PaymentError::InvalidResponse("payment intent without client_secret".to_string())
    })?;

    Ok(PaymentIntent {
        id: intent.id,
        client_secret,
    })
}

#[rocket::async_trait]
impl PaymentProvider for StripeClient {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let url = format!("{}/v1/payment_intents", self.api_base_url);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(self.api_key.expose_secret(), Option::<&str>::None)
            .form(&form_params(&request))
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        match parse_intent_response(status, &body) {
            Ok(intent) => {
                tracing::debug!("created payment intent {}", intent.id);
                Ok(intent)
            }
            Err(e) => {
                tracing::error!(status, "Stripe create_payment_intent failed");
                Err(e)
            }
        }
    }
}
