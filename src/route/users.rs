use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::data::json::documents_to_json;
use crate::data::user::{NewUser, UserDbExt};
use crate::data::{parse_object_id, DocumentStore, InsertResult, Store, UpdateResult};
use crate::resp::problem::{problems, Problem};
use crate::resp::token::AccessToken;
use crate::role::Role;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminStatus {
    pub admin: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InstructorStatus {
    pub instructor: bool,
}

/// Role lookups only answer for the caller's own email.
async fn caller_has_role(
    store: &dyn DocumentStore,
    claims: &AccessToken,
    email: &str,
    role: Role,
) -> Result<bool, Problem> {
    if claims.email() != Some(email) {
        tracing::debug!("token email differs from '{}', reporting no {} role", email, role);
        return Ok(false);
    }

    Ok(store.user_has_role(email, role).await?)
}

/// Register a user
#[utoipa::path(
    request_body = NewUser,
    responses(
        (status = 200, description = "User stored", body = InsertResult),
        (status = 400, description = "Malformed user", body = Problem),
    )
)]
#[post("/users", format = "json", data = "<user>")]
#[tracing::instrument(skip(store))]
pub async fn user_create(
    user: Json<NewUser>,
    store: &State<Store>,
) -> Result<Json<InsertResult>, Problem> {
    user.validate()?;
    Ok(Json(store.create_user(user.into_inner()).await?))
}

/// List all users
#[utoipa::path(responses((status = 200, description = "Every stored user", body = [Object])))]
#[get("/users")]
#[tracing::instrument(skip(store))]
pub async fn user_list(store: &State<Store>) -> Result<Json<Vec<Value>>, Problem> {
    Ok(Json(documents_to_json(store.list_users().await?)))
}

/// Whether the caller is an admin
#[utoipa::path(
    responses(
        (status = 200, description = "Admin flag of the caller", body = AdminStatus),
        (status = 401, description = "Missing or invalid token", body = Problem),
    ),
    security(("jwt" = []))
)]
#[get("/users/admin/<email>")]
#[tracing::instrument(skip(store, claims))]
pub async fn user_is_admin(
    email: &str,
    claims: AccessToken,
    store: &State<Store>,
) -> Result<Json<AdminStatus>, Problem> {
    let admin = caller_has_role(store.inner().as_ref(), &claims, email, Role::Admin).await?;
    Ok(Json(AdminStatus { admin }))
}

/// Whether the caller is an instructor
#[utoipa::path(
    responses(
        (status = 200, description = "Instructor flag of the caller", body = InstructorStatus),
        (status = 401, description = "Missing or invalid token", body = Problem),
    ),
    security(("jwt" = []))
)]
#[get("/users/instructor/<email>")]
#[tracing::instrument(skip(store, claims))]
pub async fn user_is_instructor(
    email: &str,
    claims: AccessToken,
    store: &State<Store>,
) -> Result<Json<InstructorStatus>, Problem> {
    let instructor =
        caller_has_role(store.inner().as_ref(), &claims, email, Role::Instructor).await?;
    Ok(Json(InstructorStatus { instructor }))
}

async fn promote(store: &dyn DocumentStore, id: &str, role: Role) -> Result<UpdateResult, Problem> {
    let id = parse_object_id(id).map_err(|_| problems::bad_object_id(id))?;
    let result = store.set_user_role(id, role).await?;
    if result.matched_count == 0 {
        tracing::warn!("no user with id {} to make {}", id, role);
    }
    Ok(result)
}

/// Make a user an admin
#[utoipa::path(
    responses(
        (status = 200, description = "Update result", body = UpdateResult),
        (status = 400, description = "Malformed id", body = Problem),
    )
)]
#[patch("/users/admin/<id>")]
#[tracing::instrument(skip(store))]
pub async fn user_make_admin(id: &str, store: &State<Store>) -> Result<Json<UpdateResult>, Problem> {
    Ok(Json(promote(store.inner().as_ref(), id, Role::Admin).await?))
}

/// Make a user an instructor
#[utoipa::path(
    responses(
        (status = 200, description = "Update result", body = UpdateResult),
        (status = 400, description = "Malformed id", body = Problem),
    )
)]
#[patch("/users/instructor/<id>")]
#[tracing::instrument(skip(store))]
pub async fn user_make_instructor(
    id: &str,
    store: &State<Store>,
) -> Result<Json<UpdateResult>, Problem> {
    Ok(Json(promote(store.inner().as_ref(), id, Role::Instructor).await?))
}

///////////////////////
//       TESTS
///////////////////////

#[cfg(test)]
mod user_endpoints {
    use rocket::http::{ContentType, Status};
    use serde_json::{json, Value};

    use super::{AdminStatus, InstructorStatus};
    use crate::data::{Collection, InsertResult, UpdateResult};
    use crate::route::testing::TestApp;

    async fn register(app: &TestApp, user: Value) -> InsertResult {
        let response = app
            .client
            .post("/users")
            .header(ContentType::JSON)
            .body(user.to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        response.into_json().await.expect("insert result")
    }

    async fn admin_flag(app: &TestApp, caller: &str, email: &str) -> bool {
        let response = app
            .client
            .get(format!("/users/admin/{}", email))
            .header(app.bearer(json!({ "email": caller })))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body: AdminStatus = response.into_json().await.expect("admin body");
        body.admin
    }

    #[rocket::async_test]
    async fn users_are_created_and_listed() {
        let app = TestApp::new().await;
        let inserted = register(&app, json!({ "email": "a@example.com", "name": "Ann" })).await;
        assert!(inserted.acknowledged);

        let users: Vec<Value> = app
            .client
            .get("/users")
            .dispatch()
            .await
            .into_json()
            .await
            .expect("user list");
        assert_eq!(users.len(), 1);
        assert_eq!(users[0]["_id"], json!(inserted.inserted_id));
        assert_eq!(users[0]["name"], json!("Ann"));
    }

    #[rocket::async_test]
    async fn invalid_email_is_rejected() {
        let app = TestApp::new().await;
        let response = app
            .client
            .post("/users")
            .header(ContentType::JSON)
            .body(json!({ "email": "not-an-email" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(app.store.count(Collection::Users), 0);
    }

    #[rocket::async_test]
    async fn signup_stores_role_as_sent() {
        let app = TestApp::new().await;
        register(&app, json!({ "email": "s@example.com", "role": "student" })).await;
        register(&app, json!({ "email": "e@example.com", "role": "" })).await;

        let users: Vec<Value> = app
            .client
            .get("/users")
            .dispatch()
            .await
            .into_json()
            .await
            .expect("user list");
        assert_eq!(users[0]["role"], json!("student"));
        assert_eq!(users[1]["role"], json!(""));

        assert!(!admin_flag(&app, "s@example.com", "s@example.com").await);
        assert!(!admin_flag(&app, "e@example.com", "e@example.com").await);
    }

    #[rocket::async_test]
    async fn admin_check_requires_token() {
        let app = TestApp::new().await;

        let response = app
            .client
            .get("/users/admin/a@example.com")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
        let body: Value = response.into_json().await.expect("problem body");
        assert_eq!(body, json!({ "error": true, "message": "unauthorized access" }));

        let response = app
            .client
            .get("/users/admin/a@example.com")
            .header(rocket::http::Header::new("Authorization", "Bearer not.a.token"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn admin_check_is_false_for_other_email() {
        let app = TestApp::new().await;
        let inserted = register(&app, json!({ "email": "boss@example.com" })).await;
        app.client
            .patch(format!("/users/admin/{}", inserted.inserted_id))
            .dispatch()
            .await;

        assert!(admin_flag(&app, "boss@example.com", "boss@example.com").await);
        assert!(!admin_flag(&app, "student@example.com", "boss@example.com").await);
    }

    #[rocket::async_test]
    async fn admin_check_follows_stored_role() {
        let app = TestApp::new().await;
        register(&app, json!({ "email": "plain@example.com" })).await;
        let coach = register(&app, json!({ "email": "coach@example.com" })).await;
        register(&app, json!({ "email": "boss@example.com", "role": "admin" })).await;

        let response = app
            .client
            .patch(format!("/users/instructor/{}", coach.inserted_id))
            .dispatch()
            .await;
        let result: UpdateResult = response.into_json().await.expect("update result");
        assert_eq!(result.modified_count, 1);

        assert!(admin_flag(&app, "boss@example.com", "boss@example.com").await);
        assert!(!admin_flag(&app, "coach@example.com", "coach@example.com").await);
        assert!(!admin_flag(&app, "plain@example.com", "plain@example.com").await);
        assert!(!admin_flag(&app, "ghost@example.com", "ghost@example.com").await);

        let response = app
            .client
            .get("/users/instructor/coach@example.com")
            .header(app.bearer(json!({ "email": "coach@example.com" })))
            .dispatch()
            .await;
        let body: InstructorStatus = response.into_json().await.expect("instructor body");
        assert!(body.instructor);
    }

    #[rocket::async_test]
    async fn promotion_handles_bad_and_unknown_ids() {
        let app = TestApp::new().await;

        let response = app.client.patch("/users/admin/42").dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);

        let response = app
            .client
            .patch("/users/admin/64b7f0c2a1b2c3d4e5f60718")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let result: UpdateResult = response.into_json().await.expect("update result");
        assert_eq!(result.matched_count, 0);
        assert_eq!(result.modified_count, 0);
    }
}
