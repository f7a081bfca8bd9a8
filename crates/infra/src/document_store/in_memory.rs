use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use pipilica_core::{DeleteAck, Document, ID_FIELD, InsertAck, UpdateAck, merge_set};

use super::r#trait::{
    Collection, DocumentStore, Filter, StoreError, StoreResult, identifier_for_insert,
};

/// In-memory document store.
///
/// Intended for tests/dev. Documents are kept per collection in insertion
/// order, which is also the order `find` returns them in.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned<T>(_: T) -> StoreError {
        StoreError::Backend("lock poisoned".to_string())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find(&self, collection: Collection, filter: Filter) -> StoreResult<Vec<Document>> {
        let map = self.collections.read().map_err(Self::poisoned)?;
        Ok(map
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> StoreResult<Option<Document>> {
        let map = self.collections.read().map_err(Self::poisoned)?;
        Ok(map
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(d)).cloned()))
    }

    async fn insert_one(
        &self,
        collection: Collection,
        mut document: Document,
    ) -> StoreResult<InsertAck> {
        let id = identifier_for_insert(&document)?;
        document.insert(ID_FIELD.to_string(), JsonValue::String(id.to_hex()));

        let mut map = self.collections.write().map_err(Self::poisoned)?;
        let docs = map.entry(collection).or_default();
        if docs.iter().any(|d| Filter::id(id).matches(d)) {
            return Err(StoreError::DuplicateKey(format!("{collection}._id {id}")));
        }
        docs.push(document);

        Ok(InsertAck::new(id))
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        set: Document,
        upsert: bool,
    ) -> StoreResult<UpdateAck> {
        if set.contains_key(ID_FIELD) {
            identifier_for_insert(&set)?;
        }

        let mut map = self.collections.write().map_err(Self::poisoned)?;
        let docs = map.entry(collection).or_default();

        if let Some(target) = docs.iter_mut().find(|d| filter.matches(d)) {
            if let Some(new_id) = set.get(ID_FIELD) {
                if target.get(ID_FIELD) != Some(new_id) {
                    return Err(StoreError::ImmutableField(ID_FIELD.to_string()));
                }
            }
            let modified = merge_set(target, &set);
            return Ok(UpdateAck::matched(modified));
        }

        if !upsert {
            return Ok(UpdateAck::unmatched());
        }

        let mut document = filter.seed();
        merge_set(&mut document, &set);
        let id = identifier_for_insert(&document)?;
        document.insert(ID_FIELD.to_string(), JsonValue::String(id.to_hex()));
        docs.push(document);

        Ok(UpdateAck::upserted(id))
    }

    async fn delete_one(&self, collection: Collection, filter: Filter) -> StoreResult<DeleteAck> {
        let mut map = self.collections.write().map_err(Self::poisoned)?;
        let Some(docs) = map.get_mut(&collection) else {
            return Ok(DeleteAck::new(0));
        };

        match docs.iter().position(|d| filter.matches(d)) {
            Some(idx) => {
                docs.remove(idx);
                Ok(DeleteAck::new(1))
            }
            None => Ok(DeleteAck::new(0)),
        }
    }
}
