//! Store-generated document identifiers.

use core::str::FromStr;

use bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// Field under which every stored document carries its identifier.
pub const ID_FIELD: &str = "_id";

/// Identifier of a stored document.
///
/// Wraps a 12-byte ObjectId. On the wire it is always the 24-character
/// lowercase hex form, never the extended-JSON `{"$oid": ...}` wrapper.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(ObjectId);

impl DocumentId {
    /// Generate a fresh identifier (timestamp + process-unique counter).
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    pub fn from_object_id(oid: ObjectId) -> Self {
        Self(oid)
    }

    pub fn as_object_id(&self) -> &ObjectId {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl From<ObjectId> for DocumentId {
    fn from(value: ObjectId) -> Self {
        Self(value)
    }
}

impl From<DocumentId> for ObjectId {
    fn from(value: DocumentId) -> Self {
        value.0
    }
}

impl FromStr for DocumentId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let oid = ObjectId::parse_str(s)
            .map_err(|e| DomainError::invalid_id(format!("DocumentId: {e}")))?;
        Ok(Self(oid))
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
