use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

use pipilica_core::{DeleteAck, Document, DocumentId, ID_FIELD, InsertAck, UpdateAck};

/// The four logical collections the gateway exposes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Bookings,
    Reviews,
    Users,
}

impl Collection {
    /// Name of the backing collection in the database.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Bookings => "bookings",
            Collection::Reviews => "reviews",
            Collection::Users => "users",
        }
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Query filter.
///
/// Only the shapes the gateway issues are representable: everything, a single
/// identifier, or equality on one top-level field.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Id(DocumentId),
    Eq { field: String, value: JsonValue },
}

impl Filter {
    pub fn id(id: DocumentId) -> Self {
        Self::Id(id)
    }

    pub fn eq(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Equality on `email`; a missing email filters on `null`.
    pub fn email(email: Option<String>) -> Self {
        Self::eq("email", email.map_or(JsonValue::Null, JsonValue::String))
    }

    /// Whether a stored document satisfies this filter.
    ///
    /// Equality against `null` also matches documents that lack the field,
    /// the same way the database evaluates it.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Id(id) => document
                .get(ID_FIELD)
                .and_then(|v| v.as_str())
                .is_some_and(|s| s == id.to_hex()),
            Filter::Eq { field, value } => {
                document.get(field).unwrap_or(&JsonValue::Null) == value
            }
        }
    }

    /// Fields an upsert seeds the new document with.
    pub(crate) fn seed(&self) -> Document {
        let mut seed = Document::new();
        match self {
            Filter::All => {}
            Filter::Id(id) => {
                seed.insert(ID_FIELD.to_string(), JsonValue::String(id.to_hex()));
            }
            Filter::Eq { field, value } => {
                seed.insert(field.clone(), value.clone());
            }
        }
        seed
    }
}

/// Document store operation error.
///
/// These are infrastructure errors. Handlers map every variant to an explicit
/// error response; nothing is left to propagate past the handler boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("unsupported identifier: {0}")]
    UnsupportedId(String),

    #[error("immutable field '{0}' cannot be updated")]
    ImmutableField(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Schema-less document store with single-document operations.
///
/// ## Semantics
///
/// - `find` returns every match in store order.
/// - `find_one` returns the first match or `None`.
/// - `insert_one` stores the document verbatim and assigns `_id` when absent.
/// - `update_one` applies `$set` merge semantics to the first match: only the
///   fields in `set` are overwritten. With `upsert`, a miss inserts a new
///   document built from the filter's equality fields plus `set`. An `_id`
///   in `set` follows the insert rules and may not change a matched
///   document's identifier (`ImmutableField`).
/// - `delete_one` removes the first match.
///
/// There are no transactions and no multi-document guarantees.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: Collection, filter: Filter) -> StoreResult<Vec<Document>>;

    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> StoreResult<Option<Document>>;

    async fn insert_one(&self, collection: Collection, document: Document)
    -> StoreResult<InsertAck>;

    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        set: Document,
        upsert: bool,
    ) -> StoreResult<UpdateAck>;

    async fn delete_one(&self, collection: Collection, filter: Filter) -> StoreResult<DeleteAck>;

    /// Release the underlying connection. Called once after the server drains.
    async fn shutdown(&self) {}
}

#[async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn find(&self, collection: Collection, filter: Filter) -> StoreResult<Vec<Document>> {
        (**self).find(collection, filter).await
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> StoreResult<Option<Document>> {
        (**self).find_one(collection, filter).await
    }

    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> StoreResult<InsertAck> {
        (**self).insert_one(collection, document).await
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        set: Document,
        upsert: bool,
    ) -> StoreResult<UpdateAck> {
        (**self).update_one(collection, filter, set, upsert).await
    }

    async fn delete_one(&self, collection: Collection, filter: Filter) -> StoreResult<DeleteAck> {
        (**self).delete_one(collection, filter).await
    }

    async fn shutdown(&self) {
        (**self).shutdown().await
    }
}

/// Resolve the identifier a new document will be stored under.
///
/// A client-supplied `_id` is honoured when it is an ObjectId hex string;
/// any other `_id` shape is rejected.
pub(crate) fn identifier_for_insert(document: &Document) -> StoreResult<DocumentId> {
    match document.get(ID_FIELD) {
        None => Ok(DocumentId::new()),
        Some(JsonValue::String(s)) => s
            .parse()
            .map_err(|_| StoreError::UnsupportedId(s.clone())),
        Some(other) => Err(StoreError::UnsupportedId(other.to_string())),
    }
}
