//! Core data model types for the ingest crate.
//!
//! ```text
//! JSON array entry ──serde──▶ RawMessageRecord (every field optional)
//!                                  │
//!                                  ▼ validate (strict / lenient)
//!                             MessageRecord
//!                             ├── id: String               (unique)
//!                             ├── conversation_id: Option<String>
//!                             ├── conversation_title: String
//!                             ├── text: String             (non-empty)
//!                             └── created_at: Option<f64>
//! ```
//!
//! Both the camelCase field names (`conversationTitle`, `createdAt`) and the
//! snake_case names written by conversation extractors (`conversation_title`,
//! `create_time`) are accepted on input.
use serde::{Deserialize, Serialize};

/// A validated message ready for the point-synthesis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Unique identifier across the whole input collection.
    pub id: String,
    /// Identifier of the conversation the message came from, if known.
    #[serde(
        default,
        alias = "conversationId",
        skip_serializing_if = "Option::is_none"
    )]
    pub conversation_id: Option<String>,
    /// Display title of the parent conversation. May repeat across records.
    #[serde(alias = "conversationTitle")]
    pub conversation_title: String,
    /// Message body. Never empty once validated.
    pub text: String,
    /// Creation timestamp in seconds since the epoch.
    #[serde(default, rename = "create_time", alias = "createdAt")]
    pub created_at: Option<f64>,
}

impl MessageRecord {
    /// Builds a record with a title and no timestamp.
    pub fn new(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            conversation_id: None,
            conversation_title: title.into(),
            text: text.into(),
            created_at: None,
        }
    }

    /// Attaches a creation timestamp.
    pub fn with_created_at(mut self, created_at: f64) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Wire shape of an input entry before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMessageRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "conversationId")]
    pub conversation_id: Option<String>,
    #[serde(default, alias = "conversationTitle")]
    pub conversation_title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, alias = "createdAt", alias = "create_time")]
    pub created_at: Option<f64>,
}

/// Counts describing what the loader kept and what it dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Entries present in the input document.
    pub total: usize,
    /// Records handed to the pipeline.
    pub kept: usize,
    /// Lenient mode: entries without usable text.
    pub dropped_missing_text: usize,
    /// Lenient mode: later entries whose id was already taken.
    pub dropped_duplicate_id: usize,
    /// Lenient mode: kept entries that received a generated id.
    pub generated_ids: usize,
}

impl LoadReport {
    /// Total number of entries that did not make it into the output.
    pub fn dropped(&self) -> usize {
        self.dropped_missing_text + self.dropped_duplicate_id
    }
}

/// Result of a successful load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRecords {
    pub records: Vec<MessageRecord>,
    pub report: LoadReport,
}
