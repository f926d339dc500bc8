use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use uuid::Uuid;

use crate::repository::StoredDocument;

/// Resource
///
/// One manageable content type (Journal, Patent, Student, ...). Every CRUD route group,
/// every server-side search and every client-side list is generic over this trait, so a
/// content type is declared once by its field schema, its searchable fields and its name.
pub trait Resource:
    Serialize + DeserializeOwned + Clone + Default + Debug + PartialEq + Send + Sync + 'static
{
    /// Name used in endpoint templates, e.g. `getAllJournal`, `updateJournal/{id}`.
    const NAME: &'static str;
    /// Store collection key.
    const COLLECTION: &'static str;

    /// Names of required fields that are empty, in declaration order.
    fn missing_fields(&self) -> Vec<&'static str>;

    /// `(field, text)` pairs a free-text search is matched against.
    fn search_fields(&self) -> Vec<(&'static str, String)>;

    /// Value of the tab/category this item is filed under, if the type has one.
    fn category(&self) -> Option<String> {
        None
    }

    /// Calendar date used by date-range filters, if the type has one.
    fn date(&self) -> Option<NaiveDate> {
        None
    }
}

/// Document
///
/// A stored resource: the server-assigned id and store timestamps, with the resource's
/// own fields flattened into the same JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document<R> {
    pub id: Uuid,
    #[serde(flatten)]
    pub body: R,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<R: Resource> TryFrom<StoredDocument> for Document<R> {
    type Error = serde_json::Error;

    fn try_from(stored: StoredDocument) -> Result<Self, Self::Error> {
        Ok(Document {
            id: stored.id,
            body: serde_json::from_value(stored.body)?,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }
}

/// Required
///
/// Collects the names of empty required fields. A string is empty when blank after
/// trimming, a list when it has no non-blank entry, an optional value when absent.
#[derive(Debug, Default)]
pub struct Required {
    missing: Vec<&'static str>,
}

impl Required {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &'static str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.missing.push(name);
        }
        self
    }

    pub fn list(mut self, name: &'static str, values: &[String]) -> Self {
        if values.iter().all(|v| v.trim().is_empty()) {
            self.missing.push(name);
        }
        self
    }

    pub fn present<T>(mut self, name: &'static str, value: &Option<T>) -> Self {
        if value.is_none() {
            self.missing.push(name);
        }
        self
    }

    pub fn finish(self) -> Vec<&'static str> {
        self.missing
    }
}

/// Formats the validation message shown for missing required fields.
pub fn missing_fields_message(fields: &[&str]) -> String {
    format!("Please fill in all required fields: {}", fields.join(", "))
}
