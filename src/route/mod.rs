use rocket::http::Status;
use rocket::{Build, Catcher, Request, Rocket, Route};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod classes;
pub mod payments;
pub mod selected;
pub mod token;
pub mod users;

use classes::*;
use payments::*;
use selected::*;
use token::*;
use users::*;

use crate::{
    data::{
        class::{ClassReview, NewClass},
        payment::NewPayment,
        selected::NewSelectedClass,
        user::NewUser,
        DeleteResult, InsertResult, UpdateResult,
    },
    resp::{
        problem::{problems, Problem},
        token::doc::JWTAuth,
    },
    role::Role,
};

pub static LIVENESS_MESSAGE: &str = "Server is running";

#[derive(OpenApi)]
#[openapi(
    paths(
        index,
        token_issue,
        user_create,
        user_list,
        user_is_admin,
        user_is_instructor,
        user_make_admin,
        user_make_instructor,
        class_create,
        class_list,
        class_approve,
        class_deny,
        class_review,
        selected_create,
        selected_list,
        selected_delete,
        payment_intent_create,
        payment_record,
        payment_history
    ),
    components(schemas(
        Role,
        NewUser,
        NewClass,
        ClassReview,
        NewSelectedClass,
        NewPayment,
        InsertResult,
        UpdateResult,
        DeleteResult,
        TokenResponse,
        AdminStatus,
        InstructorStatus,
        PaymentIntentBody,
        ClientSecretResponse,
        Problem
    )),
    modifiers(&JWTAuth)
)]
pub struct ApiDoc;

/// Liveness probe
#[utoipa::path(responses((status = 200, description = "Server is up", body = String)))]
#[get("/")]
pub async fn index() -> &'static str {
    LIVENESS_MESSAGE
}

pub fn api() -> Vec<Route> {
    routes![
        index,
        token_issue,
        user_create,
        user_list,
        user_is_admin,
        user_is_instructor,
        user_make_admin,
        user_make_instructor,
        class_create,
        class_list,
        class_approve,
        class_deny,
        class_review,
        selected_create,
        selected_list,
        selected_delete,
        payment_intent_create,
        payment_record,
        payment_history
    ]
}

#[catch(401)]
fn unauthorized() -> Problem {
    problems::unauthorized()
}

#[catch(default)]
fn fallback(status: Status, req: &Request<'_>) -> Problem {
    tracing::debug!("{} {} failed with {}", req.method(), req.uri(), status);
    Problem::new(status, status.reason().unwrap_or("request failed"))
}

pub fn catchers() -> Vec<Catcher> {
    catchers![unauthorized, fallback]
}

pub fn mount_api(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/", api())
        .mount(
            "/",
            SwaggerUi::new("/swagger-ui/<_..>").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .register("/", catchers())
}
