use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::data::json::documents_to_json;
use crate::data::payment::{NewPayment, PaymentDbExt};
use crate::data::{parse_object_id, InsertResult, Store};
use crate::payment::{create_class_payment_intent, Payments};
use crate::resp::problem::{problems, Problem};
use crate::resp::token::AccessToken;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentBody {
    #[schema(example = "64b7f0c2a1b2c3d4e5f60718")]
    pub class_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientSecretResponse {
    pub client_secret: String,
}

fn payer(claims: &AccessToken) -> Result<&str, Problem> {
    claims.email().ok_or_else(problems::unauthorized)
}

/// Open a card payment for a class
#[utoipa::path(
    request_body = PaymentIntentBody,
    responses(
        (status = 200, description = "Client secret of the new payment intent", body = ClientSecretResponse),
        (status = 401, description = "Missing or invalid token", body = Problem),
        (status = 404, description = "No such class", body = Problem),
        (status = 500, description = "Class has no price or the provider failed", body = Problem),
    ),
    security(("jwt" = []))
)]
#[post("/create-payment-intent", format = "json", data = "<body>")]
#[tracing::instrument(skip(claims, store, payments))]
pub async fn payment_intent_create(
    body: Json<PaymentIntentBody>,
    claims: AccessToken,
    store: &State<Store>,
    payments: &State<Payments>,
) -> Result<Json<ClientSecretResponse>, Problem> {
    let class_id =
        parse_object_id(&body.class_id).map_err(|_| problems::bad_object_id(&body.class_id))?;

    let intent =
        create_class_payment_intent(store.inner().as_ref(), payments.inner().as_ref(), class_id)
            .await?;
    tracing::debug!("payment intent {} opened for {:?}", intent.id, claims.email());

    Ok(Json(ClientSecretResponse {
        client_secret: intent.client_secret,
    }))
}

/// Record a completed payment for the caller
#[utoipa::path(
    request_body = NewPayment,
    responses(
        (status = 200, description = "Payment stored", body = InsertResult),
        (status = 400, description = "Malformed payment", body = Problem),
        (status = 401, description = "Missing or invalid token", body = Problem),
    ),
    security(("jwt" = []))
)]
#[post("/payments", format = "json", data = "<payment>")]
#[tracing::instrument(skip(claims, store))]
pub async fn payment_record(
    payment: Json<NewPayment>,
    claims: AccessToken,
    store: &State<Store>,
) -> Result<Json<InsertResult>, Problem> {
    let email = payer(&claims)?;
    payment.validate()?;
    Ok(Json(store.record_payment(email, payment.into_inner()).await?))
}

/// Payment history of the caller
#[utoipa::path(
    responses(
        (status = 200, description = "Payments made by the caller", body = [Object]),
        (status = 401, description = "Missing or invalid token", body = Problem),
    ),
    security(("jwt" = []))
)]
#[get("/payments")]
#[tracing::instrument(skip(claims, store))]
pub async fn payment_history(
    claims: AccessToken,
    store: &State<Store>,
) -> Result<Json<Vec<Value>>, Problem> {
    let email = payer(&claims)?;
    Ok(Json(documents_to_json(store.payments_for(email).await?)))
}

///////////////////////
//       TESTS
///////////////////////
