//! Document access for the four `sportsDB` collections.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use bson::oid::ObjectId;
use bson::{doc, Document};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::BackendError;

pub mod class;
pub mod json;
#[cfg(test)]
pub mod memory;
pub mod mongo;
pub mod payment;
pub mod selected;
pub mod user;

pub type Store = Arc<dyn DocumentStore>;

pub static ID_FIELD: &str = "_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Classes,
    SelectedClasses,
    Payments,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Classes => "classes",
            Collection::SelectedClasses => "selectedclasses",
            Collection::Payments => "payments",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<String>,
    pub upserted_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

#[inline]
pub fn by_id(id: ObjectId) -> Document {
    doc! { ID_FIELD: id }
}

pub fn parse_object_id(id: impl AsRef<str>) -> Result<ObjectId, BackendError> {
    Ok(ObjectId::parse_str(id.as_ref())?)
}

/// Generic per-collection operations. Every typed repository in this module is built on these.
#[rocket::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts `document`, assigning a fresh `_id`.
    async fn insert(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertResult, BackendError>;

    /// All documents matching every field of `filter`, in insertion order.
    async fn find(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<Vec<Document>, BackendError>;

    async fn find_one(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<Option<Document>, BackendError>;

    /// `$set`s `fields` on the document with `id`. No match is a zero count, not an error.
    async fn update_fields(
        &self,
        collection: Collection,
        id: ObjectId,
        fields: Document,
    ) -> Result<UpdateResult, BackendError>;

    async fn delete_one(
        &self,
        collection: Collection,
        id: ObjectId,
    ) -> Result<DeleteResult, BackendError>;

    async fn list_all(&self, collection: Collection) -> Result<Vec<Document>, BackendError> {
        self.find(collection, Document::new()).await
    }
}

/// Replaces any client supplied `_id` with a server generated one.
pub(crate) fn with_fresh_id(mut document: Document) -> (ObjectId, Document) {
    let id = ObjectId::new();
    document.remove(ID_FIELD);
    let mut out = doc! { ID_FIELD: id };
    out.extend(document);
    (id, out)
}
