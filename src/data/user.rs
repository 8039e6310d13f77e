use bson::oid::ObjectId;
use bson::{doc, Document};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Collection, DocumentStore, InsertResult, UpdateResult};
use crate::error::BackendError;
use crate::resp::problem::{problems, Problem};
use crate::role::Role;

/// Signup payload. Everything besides `email`, a `role` string included, is stored as sent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewUser {
    #[schema(format = "email")]
    pub email: String,
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Document,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), Problem> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(problems::bad_request("Not a valid e-mail address."));
        }
        Ok(())
    }
}

#[rocket::async_trait]
pub trait UserDbExt {
    async fn create_user(&self, user: NewUser) -> Result<InsertResult, BackendError>;
    async fn list_users(&self) -> Result<Vec<Document>, BackendError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<Document>, BackendError>;
    async fn set_user_role(&self, id: ObjectId, role: Role) -> Result<UpdateResult, BackendError>;

    /// False for a missing user, a user without a role, or any other role.
    async fn user_has_role(&self, email: &str, role: Role) -> Result<bool, BackendError> {
        let user = self.find_user_by_email(email).await?;
        Ok(role.matches(user.as_ref().and_then(|it| it.get_str("role").ok())))
    }
}

#[rocket::async_trait]
impl<S: DocumentStore + ?Sized> UserDbExt for S {
    async fn create_user(&self, user: NewUser) -> Result<InsertResult, BackendError> {
        self.insert(Collection::Users, bson::to_document(&user)?).await
    }

    async fn list_users(&self) -> Result<Vec<Document>, BackendError> {
        self.list_all(Collection::Users).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<Document>, BackendError> {
        self.find_one(Collection::Users, doc! { "email": email }).await
    }

    async fn set_user_role(&self, id: ObjectId, role: Role) -> Result<UpdateResult, BackendError> {
        self.update_fields(Collection::Users, id, doc! { "role": role })
            .await
    }
}
