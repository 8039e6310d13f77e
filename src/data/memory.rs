use std::collections::HashMap;
use std::sync::Mutex;

use bson::oid::ObjectId;
use bson::{Bson, Document};

use super::{
    with_fresh_id, Collection, DeleteResult, DocumentStore, InsertResult, UpdateResult, ID_FIELD,
};
use crate::error::BackendError;

/// In-process [`DocumentStore`] with exact-match filters.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Collection, Vec<Document>>>,
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, expected)| document.get(key) == Some(expected))
}

fn has_id(document: &Document, id: ObjectId) -> bool {
    document.get(ID_FIELD) == Some(&Bson::ObjectId(id))
}

impl MemoryStore {
    pub fn count(&self, collection: Collection) -> usize {
        self.collections
            .lock()
            .expect("memory store lock poisoned")
            .get(&collection)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[rocket::async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertResult, BackendError> {
        let (id, document) = with_fresh_id(document);
        self.collections
            .lock()
            .expect("memory store lock poisoned")
            .entry(collection)
            .or_default()
            .push(document);

        Ok(InsertResult {
            acknowledged: true,
            inserted_id: id.to_hex(),
        })
    }

    async fn find(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<Vec<Document>, BackendError> {
        let collections = self.collections.lock().expect("memory store lock poisoned");
        Ok(collections
            .get(&collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|it| matches(it, &filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<Option<Document>, BackendError> {
        Ok(self.find(collection, filter).await?.into_iter().next())
    }

    async fn update_fields(
        &self,
        collection: Collection,
        id: ObjectId,
        fields: Document,
    ) -> Result<UpdateResult, BackendError> {
        let mut collections = self.collections.lock().expect("memory store lock poisoned");
        let target = collections
            .entry(collection)
            .or_default()
            .iter_mut()
            .find(|it| has_id(it, id));

        let (matched_count, modified_count) = match target {
            Some(document) => {
                let mut modified = false;
                for (key, value) in fields {
                    if document.get(&key) != Some(&value) {
                        document.insert(key, value);
                        modified = true;
                    }
                }
                (1, u64::from(modified))
            }
            None => (0, 0),
        };

        Ok(UpdateResult {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_id: None,
            upserted_count: 0,
        })
    }

    async fn delete_one(
        &self,
        collection: Collection,
        id: ObjectId,
    ) -> Result<DeleteResult, BackendError> {
        let mut collections = self.collections.lock().expect("memory store lock poisoned");
        let documents = collections.entry(collection).or_default();

        let deleted_count = match documents.iter().position(|it| has_id(it, id)) {
            Some(index) => {
                documents.remove(index);
                1
            }
            None => 0,
        };

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count,
        })
    }
}
