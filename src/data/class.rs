use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{by_id, Collection, DocumentStore, InsertResult, UpdateResult};
use crate::error::BackendError;
use crate::resp::problem::{problems, Problem};

/// Review state of a class. Anything besides the three known states is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ClassStatus {
    #[default]
    Pending,
    Approved,
    Denied,
    Other(String),
}

impl ClassStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ClassStatus::Pending => "pending",
            ClassStatus::Approved => "approved",
            ClassStatus::Denied => "denied",
            ClassStatus::Other(other) => other,
        }
    }
}

impl From<String> for ClassStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => ClassStatus::Pending,
            "approved" => ClassStatus::Approved,
            "denied" => ClassStatus::Denied,
            _ => ClassStatus::Other(value),
        }
    }
}

impl From<ClassStatus> for String {
    fn from(value: ClassStatus) -> Self {
        match value {
            ClassStatus::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl From<ClassStatus> for Bson {
    fn from(value: ClassStatus) -> Self {
        Bson::String(value.into())
    }
}

/// Instructor submission. Title, instructor and seat fields are stored as sent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewClass {
    pub price: f64,
    #[serde(default)]
    #[schema(value_type = String, example = "pending")]
    pub status: ClassStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Document,
}

impl NewClass {
    pub fn validate(&self) -> Result<(), Problem> {
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(problems::bad_request(
                "Class price must be a non-negative number.",
            ));
        }
        Ok(())
    }
}

/// Body of `PATCH /classes/<id>`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassReview {
    #[schema(value_type = String, example = "denied")]
    pub status: ClassStatus,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl ClassReview {
    /// Only the fields present in the request are overwritten.
    pub fn to_fields(&self) -> Document {
        let mut fields = doc! { "status": self.status.clone() };
        if let Some(feedback) = &self.feedback {
            fields.insert("feedback", feedback.as_str());
        }
        fields
    }
}

/// Reads `price` whichever numeric BSON type it was stored as.
pub fn price_of(class: &Document) -> Option<f64> {
    match class.get("price")? {
        Bson::Double(price) => Some(*price),
        Bson::Int32(price) => Some(f64::from(*price)),
        Bson::Int64(price) => Some(*price as f64),
        Bson::String(price) => price.trim().parse().ok(),
        _ => None,
    }
}

#[rocket::async_trait]
pub trait ClassDbExt {
    async fn create_class(&self, class: NewClass) -> Result<InsertResult, BackendError>;
    async fn list_classes(&self) -> Result<Vec<Document>, BackendError>;
    async fn get_class(&self, id: ObjectId) -> Result<Option<Document>, BackendError>;
    async fn update_class(
        &self,
        id: ObjectId,
        fields: Document,
    ) -> Result<UpdateResult, BackendError>;

    async fn set_class_status(
        &self,
        id: ObjectId,
        status: ClassStatus,
    ) -> Result<UpdateResult, BackendError> {
        self.update_class(id, doc! { "status": status }).await
    }
}

#[rocket::async_trait]
impl<S: DocumentStore + ?Sized> ClassDbExt for S {
    async fn create_class(&self, class: NewClass) -> Result<InsertResult, BackendError> {
        self.insert(Collection::Classes, bson::to_document(&class)?)
            .await
    }

    async fn list_classes(&self) -> Result<Vec<Document>, BackendError> {
        self.list_all(Collection::Classes).await
    }

    async fn get_class(&self, id: ObjectId) -> Result<Option<Document>, BackendError> {
        self.find_one(Collection::Classes, by_id(id)).await
    }

    async fn update_class(
        &self,
        id: ObjectId,
        fields: Document,
    ) -> Result<UpdateResult, BackendError> {
        self.update_fields(Collection::Classes, id, fields).await
    }
}
