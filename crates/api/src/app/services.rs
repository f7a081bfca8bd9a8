//! Store and verifier wiring shared by every handler.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use secrecy::ExposeSecret;

use pipilica_auth::{FirebaseVerifier, Hs256Verifier, IdentityVerifier};
use pipilica_core::{DeleteAck, Document, DocumentId, InsertAck, UpdateAck};
use pipilica_infra::{
    AuthConfig, Collection, DocumentStore, Filter, InMemoryDocumentStore, MongoDocumentStore,
    StoreConfig, StoreResult,
};

/// Thin facade over the document store: one method per handler operation.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn DocumentStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, collection: Collection) -> StoreResult<Vec<Document>> {
        self.store.find(collection, Filter::All).await
    }

    pub async fn list_by_email(
        &self,
        collection: Collection,
        email: Option<String>,
    ) -> StoreResult<Vec<Document>> {
        self.store.find(collection, Filter::email(email)).await
    }

    pub async fn get_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> StoreResult<Option<Document>> {
        self.store.find_one(collection, Filter::id(id)).await
    }

    pub async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<Document>> {
        self.store
            .find_one(Collection::Users, Filter::email(Some(email.to_string())))
            .await
    }

    pub async fn create(&self, collection: Collection, document: Document) -> StoreResult<InsertAck> {
        self.store.insert_one(collection, document).await
    }

    pub async fn delete_by_id(&self, collection: Collection, id: DocumentId) -> StoreResult<DeleteAck> {
        self.store.delete_one(collection, Filter::id(id)).await
    }

    pub async fn update_by_id(
        &self,
        collection: Collection,
        id: DocumentId,
        set: Document,
    ) -> StoreResult<UpdateAck> {
        self.store.update_one(collection, Filter::id(id), set, false).await
    }

    /// Upsert keyed on the document's own `email` field.
    pub async fn upsert_by_email(&self, collection: Collection, document: Document) -> StoreResult<UpdateAck> {
        let email = document.get("email").cloned().unwrap_or(JsonValue::Null);
        self.store
            .update_one(collection, Filter::eq("email", email), document, true)
            .await
    }

    /// `$set` on the first document whose `email` equals `email`; no upsert.
    pub async fn set_by_email(
        &self,
        collection: Collection,
        email: JsonValue,
        set: Document,
    ) -> StoreResult<UpdateAck> {
        self.store
            .update_one(collection, Filter::eq("email", email), set, false)
            .await
    }

    pub async fn shutdown(&self) {
        self.store.shutdown().await;
    }
}

/// Construct the configured document store.
///
/// The Mongo backend is pinged once so bad credentials fail start-up instead
/// of the first request.
pub async fn build_services(config: &StoreConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn DocumentStore> = match config {
        StoreConfig::Mongo { uri, db_name } => {
            let store = MongoDocumentStore::connect(uri.expose_secret(), db_name).await?;
            store.ping().await?;
            tracing::info!(db = %db_name, "connected to document store");
            Arc::new(store)
        }
        StoreConfig::InMemory => {
            tracing::warn!("using in-memory document store; data is lost on exit");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    Ok(AppServices::new(store))
}

pub fn build_verifier(config: &AuthConfig) -> Arc<dyn IdentityVerifier> {
    match config {
        AuthConfig::Firebase { project_id } => {
            tracing::info!(project = %project_id, "verifying Firebase ID tokens");
            Arc::new(FirebaseVerifier::new(project_id.clone()))
        }
        AuthConfig::SharedSecret {
            secret,
            insecure_default,
        } => {
            if *insecure_default {
                tracing::warn!(
                    "no FIREBASE_PROJECT_ID or JWT_SECRET set; using insecure development secret"
                );
            }
            Arc::new(Hs256Verifier::new(secret.expose_secret().as_bytes()))
        }
    }
}
