use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use utoipa::ToSchema;

use crate::error::BackendError;
use crate::payment::PaymentError;

pub static UNAUTHORIZED_MESSAGE: &str = "unauthorized access";

/// Error returned by every route. Renders as `{"error": true, "message": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Problem {
    #[serde(skip, default = "internal_status")]
    pub status: Status,
    pub error: bool,
    pub message: String,
}

fn internal_status() -> Status {
    Status::InternalServerError
}

impl Problem {
    pub fn new(status: Status, message: impl ToString) -> Problem {
        Problem {
            status,
            error: true,
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Problem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for Problem {}

impl<'r> Responder<'r, 'static> for Problem {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        (self.status, Json(self)).respond_to(req)
    }
}

pub mod problems {
    use super::{Problem, UNAUTHORIZED_MESSAGE};
    use rocket::http::Status;

    #[inline]
    pub fn unauthorized() -> Problem {
        Problem::new(Status::Unauthorized, UNAUTHORIZED_MESSAGE)
    }

    #[inline]
    pub fn bad_request(message: impl ToString) -> Problem {
        Problem::new(Status::BadRequest, message)
    }

    #[inline]
    pub fn not_found(message: impl ToString) -> Problem {
        Problem::new(Status::NotFound, message)
    }

    #[inline]
    pub fn internal(message: impl ToString) -> Problem {
        Problem::new(Status::InternalServerError, message)
    }

    #[inline]
    pub fn bad_object_id(id: impl AsRef<str>) -> Problem {
        bad_request(format!("'{}' is not a valid object id", id.as_ref()))
    }
}

impl From<mongodb::error::Error> for Problem {
    fn from(e: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        tracing::error!("MongoDB error: {}", e);

        match e.kind.as_ref() {
            ErrorKind::Authentication { .. }
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::ServerSelection { .. }
            | ErrorKind::InvalidTlsConfig { .. }
            | ErrorKind::IncompatibleServer { .. } => {
                problems::internal("Server was unable to access MongoDB.")
            }
            ErrorKind::BsonDeserialization(_) | ErrorKind::BsonSerialization(_) => {
                problems::internal("There was a problem with handling MongoDB bson.")
            }
            ErrorKind::Io(_) => problems::internal(
                "An IO error occurred. Submitted data might not be properly stored.",
            ),
            ErrorKind::Write(_) => problems::internal(
                "A write error occurred. Submitted data might not be properly stored.",
            ),
            _ => problems::internal("MongoDB failed while processing request."),
        }
    }
}

impl From<bson::oid::Error> for Problem {
    fn from(e: bson::oid::Error) -> Self {
        problems::bad_request(format!("invalid object id: {}", e))
    }
}

impl From<jsonwebtoken::errors::Error> for Problem {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        tracing::debug!("rejected token: {}", e);
        problems::unauthorized()
    }
}

impl From<PaymentError> for Problem {
    fn from(e: PaymentError) -> Self {
        tracing::error!("payment provider failure: {}", e);
        problems::internal("payment provider error")
    }
}

impl From<BackendError> for Problem {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Database(e) => Problem::from(e),
            BackendError::InvalidObjectId(e) => Problem::from(e),
            BackendError::Jwt(e) => Problem::from(e),
            BackendError::Payment(e) => Problem::from(e),
            BackendError::BsonDe(e) => {
                tracing::error!("BSON decoding failed: {}", e);
                problems::internal("An error occurred while processing BSON data.")
            }
            BackendError::BsonSer(e) => {
                tracing::error!("BSON encoding failed: {}", e);
                problems::internal("An error occurred while processing BSON data.")
            }
            other => {
                tracing::error!("backend error: {}", other);
                problems::internal("internal server error")
            }
        }
    }
}
