use bson::oid::ObjectId;
use bson::Document;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Collection, DeleteResult, DocumentStore, InsertResult, ID_FIELD};
use crate::error::BackendError;
use crate::resp::problem::{problems, Problem};

/// A class placed in a student's cart: the class reference and the student's email, as sent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewSelectedClass {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub fields: Document,
}

impl NewSelectedClass {
    pub fn validate(&self) -> Result<(), Problem> {
        if self.fields.keys().all(|key| key == ID_FIELD) {
            return Err(problems::bad_request("Selected class must not be empty."));
        }
        Ok(())
    }
}

#[rocket::async_trait]
pub trait SelectedClassDbExt {
    async fn select_class(&self, selection: NewSelectedClass)
        -> Result<InsertResult, BackendError>;
    async fn list_selected_classes(&self) -> Result<Vec<Document>, BackendError>;
    async fn remove_selected_class(&self, id: ObjectId) -> Result<DeleteResult, BackendError>;
}

#[rocket::async_trait]
impl<S: DocumentStore + ?Sized> SelectedClassDbExt for S {
    async fn select_class(
        &self,
        selection: NewSelectedClass,
    ) -> Result<InsertResult, BackendError> {
        self.insert(Collection::SelectedClasses, selection.fields)
            .await
    }

    async fn list_selected_classes(&self) -> Result<Vec<Document>, BackendError> {
        self.list_all(Collection::SelectedClasses).await
    }

    async fn remove_selected_class(&self, id: ObjectId) -> Result<DeleteResult, BackendError> {
        self.delete_one(Collection::SelectedClasses, id).await
    }
}
