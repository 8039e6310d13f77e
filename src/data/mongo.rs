use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use mongodb::options::{ClientOptions, ServerApi, ServerApiVersion};
use mongodb::{Client, Database};
use rocket::futures::TryStreamExt;

use super::{
    by_id, with_fresh_id, Collection, DeleteResult, DocumentStore, InsertResult, UpdateResult,
};
use crate::error::BackendError;

pub static APP_NAME: &str = "sportsclass-backend";

/// MongoDB-backed [`DocumentStore`]. Cloning shares the driver's connection pool.
#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Builds a client pinned to Stable API v1 and checks the deployment answers a ping.
    pub async fn connect(uri: &str, db_name: &str) -> Result<MongoStore, BackendError> {
        let mut options = ClientOptions::parse(uri).await?;
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );
        options.app_name = Some(APP_NAME.to_string());

        let client = Client::with_options(options)?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        tracing::info!("Pinged MongoDB deployment. Connection established.");

        let db = client.database(db_name);
        Ok(MongoStore { client, db })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<Document> {
        self.db.collection(collection.name())
    }
}

fn id_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        other => other.to_string(),
    }
}

#[rocket::async_trait]
impl DocumentStore for MongoStore {
    async fn insert(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertResult, BackendError> {
        let (_, document) = with_fresh_id(document);
        let result = self.collection(collection).insert_one(document, None).await?;

        Ok(InsertResult {
            acknowledged: true,
            inserted_id: id_string(&result.inserted_id),
        })
    }

    async fn find(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<Vec<Document>, BackendError> {
        let cursor = self.collection(collection).find(filter, None).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents)
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<Option<Document>, BackendError> {
        Ok(self.collection(collection).find_one(filter, None).await?)
    }

    async fn update_fields(
        &self,
        collection: Collection,
        id: ObjectId,
        fields: Document,
    ) -> Result<UpdateResult, BackendError> {
        let result = self
            .collection(collection)
            .update_one(by_id(id), doc! { "$set": fields }, None)
            .await?;

        Ok(UpdateResult {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_count: u64::from(result.upserted_id.is_some()),
            upserted_id: result.upserted_id.as_ref().map(id_string),
        })
    }

    async fn delete_one(
        &self,
        collection: Collection,
        id: ObjectId,
    ) -> Result<DeleteResult, BackendError> {
        let result = self.collection(collection).delete_one(by_id(id), None).await?;

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }
}
