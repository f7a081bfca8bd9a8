//! MongoDB-backed document store.
//!
//! One `Client` is created at start-up and shared by every request; the driver
//! pools connections internally. Documents cross the boundary as JSON objects:
//! `_id` ObjectIds are rendered as hex strings on the way out and hex `_id`
//! strings become ObjectIds on the way in.

use async_trait::async_trait;
use bson::{Bson, doc};
use futures_util::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{Client, Database};
use serde_json::Value as JsonValue;

use pipilica_core::{DeleteAck, Document, DocumentId, ID_FIELD, InsertAck, UpdateAck};

use super::r#trait::{
    Collection, DocumentStore, Filter, StoreError, StoreResult, identifier_for_insert,
};

const DUPLICATE_KEY_CODE: i32 = 11000;
const IMMUTABLE_FIELD_CODE: i32 = 66;

#[derive(Clone)]
pub struct MongoDocumentStore {
    client: Client,
    db: Database,
}

impl MongoDocumentStore {
    /// Connect to the deployment at `uri` and use database `db_name`.
    ///
    /// The driver connects lazily; call [`ping`](Self::ping) to fail fast on
    /// bad credentials or an unreachable cluster.
    pub async fn connect(uri: &str, db_name: &str) -> StoreResult<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| map_mongo_error("connect", e))?;
        let db = client.database(db_name);
        Ok(Self { client, db })
    }

    pub async fn ping(&self) -> StoreResult<()> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| map_mongo_error("ping", e))?;
        Ok(())
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<bson::Document> {
        self.db.collection(collection.name())
    }
}

impl core::fmt::Debug for MongoDocumentStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MongoDocumentStore")
            .field("db", &self.db.name())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn find(&self, collection: Collection, filter: Filter) -> StoreResult<Vec<Document>> {
        let cursor = self
            .collection(collection)
            .find(filter_to_bson(&filter)?)
            .await
            .map_err(|e| map_mongo_error("find", e))?;

        let docs: Vec<bson::Document> = cursor
            .try_collect()
            .await
            .map_err(|e| map_mongo_error("find", e))?;

        Ok(docs.into_iter().map(bson_to_json).collect())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> StoreResult<Option<Document>> {
        let found = self
            .collection(collection)
            .find_one(filter_to_bson(&filter)?)
            .await
            .map_err(|e| map_mongo_error("find_one", e))?;

        Ok(found.map(bson_to_json))
    }

    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> StoreResult<InsertAck> {
        let id = identifier_for_insert(&document)?;
        let mut bson_doc = json_to_bson(document)?;
        bson_doc.insert(ID_FIELD, Bson::ObjectId(*id.as_object_id()));

        let result = self
            .collection(collection)
            .insert_one(bson_doc)
            .await
            .map_err(|e| map_mongo_error("insert_one", e))?;

        Ok(InsertAck::new(bson_to_id(result.inserted_id)?))
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        set: Document,
        upsert: bool,
    ) -> StoreResult<UpdateAck> {
        let set = set_to_bson(set)?;

        let result = self
            .collection(collection)
            .update_one(filter_to_bson(&filter)?, doc! { "$set": set })
            .upsert(upsert)
            .await
            .map_err(|e| map_mongo_error("update_one", e))?;

        let upserted_id = result.upserted_id.map(bson_to_id).transpose()?;
        Ok(UpdateAck {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_count: u64::from(upserted_id.is_some()),
            upserted_id,
        })
    }

    async fn delete_one(&self, collection: Collection, filter: Filter) -> StoreResult<DeleteAck> {
        let result = self
            .collection(collection)
            .delete_one(filter_to_bson(&filter)?)
            .await
            .map_err(|e| map_mongo_error("delete_one", e))?;

        Ok(DeleteAck::new(result.deleted_count))
    }

    async fn shutdown(&self) {
        tracing::info!("closing document store connection");
        self.client.clone().shutdown().await;
    }
}

fn filter_to_bson(filter: &Filter) -> StoreResult<bson::Document> {
    let mut out = bson::Document::new();
    match filter {
        Filter::All => {}
        Filter::Id(id) => {
            out.insert(ID_FIELD, Bson::ObjectId(*id.as_object_id()));
        }
        Filter::Eq { field, value } => {
            let value = bson::to_bson(value)
                .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;
            out.insert(field.as_str(), value);
        }
    }
    Ok(out)
}

/// `$set` payload with the same `_id` rules as an insert: a hex string
/// becomes an ObjectId and any other shape is rejected.
fn set_to_bson(set: Document) -> StoreResult<bson::Document> {
    let id = match set.get(ID_FIELD) {
        Some(_) => Some(identifier_for_insert(&set)?),
        None => None,
    };

    let mut out = json_to_bson(set)?;
    if let Some(id) = id {
        out.insert(ID_FIELD, Bson::ObjectId(*id.as_object_id()));
    }
    Ok(out)
}

fn json_to_bson(document: Document) -> StoreResult<bson::Document> {
    bson::to_document(&document).map_err(|e| StoreError::InvalidDocument(e.to_string()))
}

fn bson_to_json(document: bson::Document) -> Document {
    let mut out = Document::new();
    for (key, value) in document {
        let value = match value {
            Bson::ObjectId(oid) if key == ID_FIELD => JsonValue::String(oid.to_hex()),
            other => other.into_relaxed_extjson(),
        };
        out.insert(key, value);
    }
    out
}

fn bson_to_id(value: Bson) -> StoreResult<DocumentId> {
    match value {
        Bson::ObjectId(oid) => Ok(DocumentId::from_object_id(oid)),
        other => Err(StoreError::UnsupportedId(other.to_string())),
    }
}

fn map_mongo_error(op: &'static str, err: mongodb::error::Error) -> StoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = err.kind.as_ref() {
        if let Some(mapped) = classify_write_error(write_error.code, &write_error.message) {
            return mapped;
        }
    }
    StoreError::Backend(format!("{op}: {err}"))
}

/// Server write errors the caller can act on; everything else is a backend fault.
fn classify_write_error(code: i32, message: &str) -> Option<StoreError> {
    match code {
        DUPLICATE_KEY_CODE => Some(StoreError::DuplicateKey(message.to_string())),
        IMMUTABLE_FIELD_CODE => Some(StoreError::ImmutableField(ID_FIELD.to_string())),
        _ => None,
    }
}
