//! Document store boundary.
//!
//! Handlers talk to the store only through [`DocumentStore`]; the MongoDB
//! adapter is used in production and the in-memory adapter in dev/tests.

pub mod in_memory;
pub mod mongo;
pub mod r#trait;

pub use in_memory::InMemoryDocumentStore;
pub use mongo::MongoDocumentStore;
pub use r#trait::{Collection, DocumentStore, Filter, StoreError, StoreResult};
