use rocket::serde::json::Json;
use rocket::State;
use serde_json::Value;

use crate::data::class::{ClassDbExt, ClassReview, ClassStatus, NewClass};
use crate::data::json::documents_to_json;
use crate::data::{parse_object_id, DocumentStore, InsertResult, Store, UpdateResult};
use crate::resp::problem::{problems, Problem};

/// Submit a class for review
#[utoipa::path(
    request_body = NewClass,
    responses(
        (status = 200, description = "Class stored", body = InsertResult),
        (status = 400, description = "Malformed class", body = Problem),
    )
)]
#[post("/classes", format = "json", data = "<class>")]
#[tracing::instrument(skip(store))]
pub async fn class_create(
    class: Json<NewClass>,
    store: &State<Store>,
) -> Result<Json<InsertResult>, Problem> {
    class.validate()?;
    Ok(Json(store.create_class(class.into_inner()).await?))
}

/// List all classes regardless of status
#[utoipa::path(responses((status = 200, description = "Every stored class", body = [Object])))]
#[get("/classes")]
#[tracing::instrument(skip(store))]
pub async fn class_list(store: &State<Store>) -> Result<Json<Vec<Value>>, Problem> {
    Ok(Json(documents_to_json(store.list_classes().await?)))
}

async fn review(
    store: &dyn DocumentStore,
    id: &str,
    review: &ClassReview,
) -> Result<UpdateResult, Problem> {
    let id = parse_object_id(id).map_err(|_| problems::bad_object_id(id))?;
    let result = store.update_class(id, review.to_fields()).await?;
    tracing::info!(
        "class {} set to '{}' ({} matched)",
        id,
        review.status.as_str(),
        result.matched_count
    );
    Ok(result)
}

/// Approve a class
#[utoipa::path(
    responses(
        (status = 200, description = "Update result", body = UpdateResult),
        (status = 400, description = "Malformed id", body = Problem),
    )
)]
#[patch("/classes/approve/<id>")]
#[tracing::instrument(skip(store))]
pub async fn class_approve(id: &str, store: &State<Store>) -> Result<Json<UpdateResult>, Problem> {
    let approval = ClassReview {
        status: ClassStatus::Approved,
        feedback: None,
    };
    Ok(Json(review(store.inner().as_ref(), id, &approval).await?))
}

/// Deny a class
#[utoipa::path(
    responses(
        (status = 200, description = "Update result", body = UpdateResult),
        (status = 400, description = "Malformed id", body = Problem),
    )
)]
#[patch("/classes/deny/<id>")]
#[tracing::instrument(skip(store))]
pub async fn class_deny(id: &str, store: &State<Store>) -> Result<Json<UpdateResult>, Problem> {
    let denial = ClassReview {
        status: ClassStatus::Denied,
        feedback: None,
    };
    Ok(Json(review(store.inner().as_ref(), id, &denial).await?))
}

/// Set a class's status, optionally with feedback for the instructor
#[utoipa::path(
    request_body = ClassReview,
    responses(
        (status = 200, description = "Update result", body = UpdateResult),
        (status = 400, description = "Malformed id", body = Problem),
    )
)]
#[patch("/classes/<id>", format = "json", data = "<body>")]
#[tracing::instrument(skip(store))]
pub async fn class_review(
    id: &str,
    body: Json<ClassReview>,
    store: &State<Store>,
) -> Result<Json<UpdateResult>, Problem> {
    Ok(Json(review(store.inner().as_ref(), id, &body).await?))
}

///////////////////////
//       TESTS
///////////////////////
