use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{decode, encode, Header};
use rocket::http::Status;
use rocket::outcome::Outcome::{Error, Success};
use rocket::request::{self, FromRequest, Request};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::resp::problem::{problems, Problem};
use crate::security::Security;
use crate::util::date_time_as_unix_seconds;

pub static AUTHORIZATION_HEADER: &str = "Authorization";

pub fn token_lifetime() -> Duration {
    Duration::hours(1)
}

/// Signed access token. Whatever object the caller posted to `/jwt` travels in `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    #[serde(with = "date_time_as_unix_seconds")]
    pub iat: DateTime<Utc>,
    #[serde(with = "date_time_as_unix_seconds")]
    pub exp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl AccessToken {
    /// Rejects non-objects and payloads carrying `exp`. A posted `iat` is replaced with the
    /// issue time so `exp` is always one hour after signing.
    pub fn new(payload: Value) -> Result<AccessToken, Problem> {
        let mut payload = match payload {
            Value::Object(map) => map,
            _ => return Err(problems::bad_request("token payload must be a JSON object")),
        };

        if payload.contains_key("exp") {
            return Err(problems::bad_request(
                "token payload already has an 'exp' property",
            ));
        }
        payload.remove("iat");

        let now = Utc::now().round_subsecs(0);
        Ok(AccessToken {
            iat: now,
            exp: now + token_lifetime(),
            payload,
        })
    }

    pub fn email(&self) -> Option<&str> {
        self.payload.get("email").and_then(Value::as_str)
    }

    pub fn encode_jwt(&self, security: &Security) -> Result<String, Problem> {
        encode(
            &Header::new(Security::ALGORITHM),
            self,
            security.encoding_key(),
        )
        .map_err(|e| {
            tracing::error!("unable to sign access token: {}", e);
            problems::internal("unable to sign access token")
        })
    }

    pub fn decode_jwt(token: &str, security: &Security) -> Result<AccessToken, Problem> {
        decode::<AccessToken>(token, security.decoding_key(), &security.validation())
            .map(|data| data.claims)
            .map_err(Problem::from)
    }
}

/// Signs `payload` for one hour.
pub fn issue(payload: Value, security: &Security) -> Result<String, Problem> {
    AccessToken::new(payload)?.encode_jwt(security)
}

/// Checks signature and expiry.
pub fn verify(token: &str, security: &Security) -> Result<AccessToken, Problem> {
    AccessToken::decode_jwt(token, security)
}

/// `<scheme> <token>`; the scheme itself isn't checked.
pub fn bearer_token(header: &str) -> Option<&str> {
    header.split_whitespace().nth(1)
}

pub fn extract_claims(
    authorization: Option<&str>,
    security: &Security,
) -> Result<AccessToken, Problem> {
    let header = authorization.ok_or_else(problems::unauthorized)?;
    let token = bearer_token(header).ok_or_else(problems::unauthorized)?;

    let claims = verify(token, security)?;
    tracing::debug!("verified access token for: {:?}", claims.email());
    Ok(claims)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AccessToken {
    type Error = Problem;

    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let security = match req.rocket().state::<Security>() {
            Some(it) => it,
            None => {
                tracing::error!("token keys are not managed by rocket");
                return Error((Status::InternalServerError, problems::internal("misconfigured")));
            }
        };

        tracing::trace!("extracting access token from authorization header");
        match extract_claims(req.headers().get_one(AUTHORIZATION_HEADER), security) {
            Ok(claims) => Success(claims),
            Err(e) => {
                tracing::debug!("rejected request without a valid access token");
                Error((Status::Unauthorized, e))
            }
        }
    }
}

pub mod doc {
    use utoipa::openapi::security::*;

    #[derive(Clone, Copy)]
    pub struct JWTAuth;

    impl From<JWTAuth> for SecurityScheme {
        fn from(_: JWTAuth) -> SecurityScheme {
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            )
        }
    }

    impl utoipa::Modify for JWTAuth {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            if let Some(c) = openapi.components.as_mut() {
                c.add_security_scheme("jwt", *self)
            }
        }
    }
}
