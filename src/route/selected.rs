use rocket::serde::json::Json;
use rocket::State;
use serde_json::Value;

use crate::data::json::documents_to_json;
use crate::data::selected::{NewSelectedClass, SelectedClassDbExt};
use crate::data::{parse_object_id, DeleteResult, InsertResult, Store};
use crate::resp::problem::{problems, Problem};

/// Add a class to a student's selection
#[utoipa::path(
    request_body = NewSelectedClass,
    responses(
        (status = 200, description = "Selection stored", body = InsertResult),
        (status = 400, description = "Empty selection", body = Problem),
    )
)]
#[post("/selectedclasses", format = "json", data = "<selection>")]
#[tracing::instrument(skip(store))]
pub async fn selected_create(
    selection: Json<NewSelectedClass>,
    store: &State<Store>,
) -> Result<Json<InsertResult>, Problem> {
    selection.validate()?;
    Ok(Json(store.select_class(selection.into_inner()).await?))
}

/// List every selection of every student
#[utoipa::path(responses((status = 200, description = "Every stored selection", body = [Object])))]
#[get("/selectedclasses")]
#[tracing::instrument(skip(store))]
pub async fn selected_list(store: &State<Store>) -> Result<Json<Vec<Value>>, Problem> {
    Ok(Json(documents_to_json(store.list_selected_classes().await?)))
}

/// Remove a selection
#[utoipa::path(
    responses(
        (status = 200, description = "Delete result, zero when nothing matched", body = DeleteResult),
        (status = 400, description = "Malformed id", body = Problem),
    )
)]
#[delete("/selectedclasses/<id>")]
#[tracing::instrument(skip(store))]
pub async fn selected_delete(id: &str, store: &State<Store>) -> Result<Json<DeleteResult>, Problem> {
    let id = parse_object_id(id).map_err(|_| problems::bad_object_id(id))?;
    Ok(Json(store.remove_selected_class(id).await?))
}

///////////////////////
//       TESTS
///////////////////////

#[cfg(test)]
mod selected_endpoints {
    use rocket::http::{ContentType, Status};
    use serde_json::{json, Value};

    use crate::data::{Collection, DeleteResult, InsertResult};
    use crate::route::testing::TestApp;

    async fn select(app: &TestApp, email: &str, class_id: &str) -> InsertResult {
        let response = app
            .client
            .post("/selectedclasses")
            .header(ContentType::JSON)
            .body(json!({ "email": email, "classId": class_id }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        response.into_json().await.expect("insert result")
    }

    async fn delete(app: &TestApp, id: &str) -> DeleteResult {
        let response = app
            .client
            .delete(format!("/selectedclasses/{}", id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        response.into_json().await.expect("delete result")
    }

    #[rocket::async_test]
    async fn delete_removes_exactly_one() {
        let app = TestApp::new().await;
        let kept = select(&app, "a@example.com", "c1").await;
        let removed = select(&app, "a@example.com", "c2").await;

        assert_eq!(delete(&app, &removed.inserted_id).await.deleted_count, 1);
        assert_eq!(delete(&app, &removed.inserted_id).await.deleted_count, 0);

        let listed: Vec<Value> = app
            .client
            .get("/selectedclasses")
            .dispatch()
            .await
            .into_json()
            .await
            .expect("selection list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["_id"], json!(kept.inserted_id));
    }

    #[rocket::async_test]
    async fn delete_with_malformed_id_is_a_bad_request() {
        let app = TestApp::new().await;
        select(&app, "a@example.com", "c1").await;

        let response = app.client.delete("/selectedclasses/nope").dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);
        assert_eq!(app.store.count(Collection::SelectedClasses), 1);
    }

    #[rocket::async_test]
    async fn empty_selection_is_rejected() {
        let app = TestApp::new().await;
        let response = app
            .client
            .post("/selectedclasses")
            .header(ContentType::JSON)
            .body("{}")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn concurrent_selections_do_not_interfere() {
        let app = TestApp::new().await;

        let (first, second) = tokio::join!(
            select(&app, "a@example.com", "c1"),
            select(&app, "b@example.com", "c1"),
        );
        assert_ne!(first.inserted_id, second.inserted_id);
        assert_eq!(app.store.count(Collection::SelectedClasses), 2);

        let listed: Vec<Value> = app
            .client
            .get("/selectedclasses")
            .dispatch()
            .await
            .into_json()
            .await
            .expect("selection list");
        let mut emails: Vec<&str> = listed.iter().filter_map(|it| it["email"].as_str()).collect();
        emails.sort_unstable();
        assert_eq!(emails, vec!["a@example.com", "b@example.com"]);
    }
}
