//! Infrastructure layer: document store adapters and configuration.

pub mod config;
pub mod document_store;

pub use config::{AppConfig, AuthConfig, ConfigError, StoreConfig};
pub use document_store::{
    Collection, DocumentStore, Filter, InMemoryDocumentStore, MongoDocumentStore, StoreError,
    StoreResult,
};
