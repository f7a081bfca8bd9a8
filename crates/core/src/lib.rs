//! `pipilica-core`: shared document primitives.
//!
//! This crate holds the storage-agnostic vocabulary of the gateway: schema-less
//! documents, their identifiers and the acknowledgments returned by writes.

pub mod ack;
pub mod document;
pub mod error;
pub mod id;

pub use ack::{DeleteAck, InsertAck, UpdateAck};
pub use document::{Document, document_from_value, merge_set};
pub use error::DomainError;
pub use id::{DocumentId, ID_FIELD};
