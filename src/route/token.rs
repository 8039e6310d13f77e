use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::resp::problem::Problem;
use crate::resp::token;
use crate::security::Security;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Sign the posted identity for one hour
#[utoipa::path(
    request_body(content = Object, description = "Identity claims, usually `{email}`"),
    responses(
        (status = 200, description = "Signed access token", body = TokenResponse),
        (status = 400, description = "Payload is not a JSON object", body = Problem),
    )
)]
#[post("/jwt", format = "json", data = "<payload>")]
#[tracing::instrument(skip(payload, security))]
pub async fn token_issue(
    payload: Json<Value>,
    security: &State<Security>,
) -> Result<Json<TokenResponse>, Problem> {
    let token = token::issue(payload.into_inner(), security)?;
    Ok(Json(TokenResponse { token }))
}

#[cfg(test)]
mod token_endpoints {
    use rocket::http::{ContentType, Status};
    use serde_json::json;

    use super::TokenResponse;
    use crate::resp::token::verify;
    use crate::route::testing::TestApp;

    #[rocket::async_test]
    async fn issued_token_carries_payload() {
        let app = TestApp::new().await;

        let response = app
            .client
            .post("/jwt")
            .header(ContentType::JSON)
            .body(json!({ "email": "student@example.com", "name": "Sam" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);

        let body: TokenResponse = response.into_json().await.expect("token body");
        let claims = verify(&body.token, &app.security).expect("token verifies");
        assert_eq!(claims.email(), Some("student@example.com"));
        assert_eq!(claims.payload.get("name"), Some(&json!("Sam")));
    }

    #[rocket::async_test]
    async fn non_object_payload_is_rejected() {
        let app = TestApp::new().await;

        let response = app
            .client
            .post("/jwt")
            .header(ContentType::JSON)
            .body("\"student@example.com\"")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);

        let body: serde_json::Value = response.into_json().await.expect("problem body");
        assert_eq!(body["error"], json!(true));
    }
}
