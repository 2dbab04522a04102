//! Task record types and store acknowledgments.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Field holding the record identifier inside a stored document.
pub const ID_FIELD: &str = "_id";

/// Field holding the owner's email inside a stored document.
pub const OWNER_FIELD: &str = "userEmail";

/// A schemaless task document (a JSON object).
pub type TaskDocument = Map<String, Value>;

/// Unique identifier for a task record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Create a TaskId from a UUID.
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a TaskId from its string form.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TaskId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A stored task: its identifier plus the full document.
///
/// The document always carries the identifier under [`ID_FIELD`], and
/// serializes as that document.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    id: TaskId,
    document: TaskDocument,
}

impl TaskRecord {
    /// Wrap a document, stamping `id` into its `_id` field.
    ///
    /// Any `_id` already present in the document is overwritten.
    pub fn new(id: TaskId, mut document: TaskDocument) -> Self {
        document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        Self { id, document }
    }

    /// The record identifier.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The owner email, if the document has a string `userEmail` field.
    pub fn owner(&self) -> Option<&str> {
        self.document.get(OWNER_FIELD).and_then(Value::as_str)
    }

    /// Borrow the document.
    pub fn document(&self) -> &TaskDocument {
        &self.document
    }

    /// Apply an update, returning whether any field actually changed.
    pub fn apply(&mut self, update: &TaskUpdate) -> bool {
        let mut modified = false;
        for (key, value) in update.fields() {
            if self.document.get(&key) != Some(&value) {
                self.document.insert(key, value);
                modified = true;
            }
        }
        modified
    }

    /// Consume the record, returning the document.
    pub fn into_document(self) -> TaskDocument {
        self.document
    }
}

impl Serialize for TaskRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.document.serialize(serializer)
    }
}

/// Replaceable fields of a task/blog record.
///
/// Fields left as `None` are not touched by an update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    /// Banner image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    /// Title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Category label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    /// Long description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
}

impl TaskUpdate {
    /// The present fields as a document fragment, keyed by their wire names.
    pub fn fields(&self) -> TaskDocument {
        let pairs = [
            ("bannerUrl", &self.banner_url),
            ("title", &self.title),
            ("category", &self.category),
            ("shortDescription", &self.short_description),
            ("longDescription", &self.long_description),
        ];
        pairs
            .into_iter()
            .filter_map(|(key, value)| {
                value
                    .as_ref()
                    .map(|v| (key.to_string(), Value::String(v.clone())))
            })
            .collect()
    }

    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

/// Acknowledgment of a task insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAck {
    /// Always true once the store accepted the write.
    pub acknowledged: bool,
    /// Identifier assigned to the new record.
    pub inserted_id: TaskId,
}

impl InsertAck {
    /// Acknowledge an insert of `id`.
    pub fn new(inserted_id: TaskId) -> Self {
        Self {
            acknowledged: true,
            inserted_id,
        }
    }
}

/// Acknowledgment of a non-upserting update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAck {
    /// Always true once the store accepted the write.
    pub acknowledged: bool,
    /// Records matched by the identifier (0 or 1).
    pub matched_count: u64,
    /// Records whose content actually changed.
    pub modified_count: u64,
    /// Always 0: updates never insert.
    pub upserted_count: u64,
    /// Always `None`: updates never insert.
    pub upserted_id: Option<TaskId>,
}

impl UpdateAck {
    /// Acknowledge an update with the given counts.
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_count: 0,
            upserted_id: None,
        }
    }
}
