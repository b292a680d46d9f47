//! Neural Galaxy ingest layer
//!
//! This is where message records enter the pipeline. We take a JSON array of
//! extracted messages, check that every entry is usable, and hand back an
//! ordered `Vec<MessageRecord>` that downstream stages can index into without
//! second-guessing.
//!
//! ## What we do here
//!
//! - **Parse** - The input must be a JSON array of objects. Anything else is a
//!   data-format error before any stage runs.
//! - **Validate** - Every record needs an `id` and non-blank `text`; ids must be
//!   unique. Strict mode fails on the first violation and names the record.
//!   Lenient mode drops the record, counts it, and keeps going.
//! - **Preserve order** - Output order is input order. Nothing is sorted or
//!   deduplicated by anything other than position.
//! - **Leave text alone** - Text is passed through byte for byte. Length caps
//!   are the exporter's business.
//!
//! ## Example
//!
//! ```
//! use ingest::{parse_records, LoaderConfig};
//!
//! let json = r#"[
//!     {"id": "a", "conversation_title": "Ideas", "text": "Sketch a logo", "create_time": 1.0},
//!     {"id": "b", "text": "Draft the launch post"}
//! ]"#;
//!
//! let loaded = parse_records(json, &LoaderConfig::default()).unwrap();
//! assert_eq!(loaded.records.len(), 2);
//! assert_eq!(loaded.records[1].conversation_title, "Untitled");
//! assert_eq!(loaded.report.dropped(), 0);
//! ```
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Instant;

use serde_json::Value;
use tracing::{info, warn};

mod config;
mod error;
mod sample;
mod types;

pub use crate::config::{LoaderConfig, DEFAULT_TITLE};
pub use crate::error::IngestError;
pub use crate::sample::SampleGenerator;
pub use crate::types::{LoadReport, LoadedRecords, MessageRecord, RawMessageRecord};

/// Reads and validates the message collection stored at `path`.
pub fn load_records(
    path: impl AsRef<Path>,
    cfg: &LoaderConfig,
) -> Result<LoadedRecords, IngestError> {
    let path = path.as_ref();
    let start = Instant::now();
    let content = fs::read_to_string(path).map_err(|err| IngestError::Read {
        path: path.display().to_string(),
        reason: err.to_string(),
    })?;

    let span = tracing::info_span!("ingest.load", path = %path.display(), strict = cfg.strict);
    let _guard = span.enter();

    match parse_records(&content, cfg) {
        Ok(loaded) => {
            info!(
                bytes = content.len(),
                elapsed_micros = start.elapsed().as_micros(),
                "load_success"
            );
            Ok(loaded)
        }
        Err(err) => {
            warn!(error = %err, elapsed_micros = start.elapsed().as_micros(), "load_failure");
            Err(err)
        }
    }
}

/// Parses and validates an in-memory JSON document.
pub fn parse_records(json: &str, cfg: &LoaderConfig) -> Result<LoadedRecords, IngestError> {
    let document: Value =
        serde_json::from_str(json).map_err(|err| IngestError::NotAnArray(err.to_string()))?;
    let entries = match document {
        Value::Array(entries) => entries,
        other => {
            return Err(IngestError::NotAnArray(format!(
                "top-level value is {}",
                json_kind(&other)
            )))
        }
    };

    let mut raw = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        if !entry.is_object() {
            return Err(IngestError::MalformedRecord {
                index,
                reason: format!("expected an object, found {}", json_kind(&entry)),
            });
        }
        let record: RawMessageRecord =
            serde_json::from_value(entry).map_err(|err| IngestError::MalformedRecord {
                index,
                reason: err.to_string(),
            })?;
        raw.push(record);
    }

    validate_records(raw, cfg)
}

/// Applies the strict/lenient policy to already-decoded entries.
pub fn validate_records(
    raw: Vec<RawMessageRecord>,
    cfg: &LoaderConfig,
) -> Result<LoadedRecords, IngestError> {
    let mut report = LoadReport {
        total: raw.len(),
        ..LoadReport::default()
    };
    let mut records = Vec::with_capacity(raw.len());
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(raw.len());
    // Ids present anywhere in the input; generated ids must avoid all of them.
    let mut taken: HashSet<String> = if cfg.strict {
        HashSet::new()
    } else {
        raw.iter().filter_map(|r| explicit_id(r.id.as_deref())).collect()
    };

    for (index, entry) in raw.into_iter().enumerate() {
        let RawMessageRecord {
            id,
            conversation_id,
            conversation_title,
            text,
            created_at,
        } = entry;

        let id = match id.filter(|id| !id.trim().is_empty()) {
            Some(id) => id,
            None if cfg.strict => return Err(IngestError::MissingField { index, field: "id" }),
            None => {
                report.generated_ids += 1;
                generate_id(index, &mut taken)
            }
        };

        let text = match text {
            Some(text) if !text.trim().is_empty() => text,
            Some(_) if cfg.strict => return Err(IngestError::EmptyText { index, id }),
            None if cfg.strict => {
                return Err(IngestError::MissingField {
                    index,
                    field: "text",
                })
            }
            _ => {
                warn!(index, id = %id, "dropping record without text");
                report.dropped_missing_text += 1;
                continue;
            }
        };

        if let Some(&first_index) = seen.get(&id) {
            if cfg.strict {
                return Err(IngestError::DuplicateId {
                    index,
                    id,
                    first_index,
                });
            }
            warn!(index, id = %id, first_index, "dropping record with duplicate id");
            report.dropped_duplicate_id += 1;
            continue;
        }
        seen.insert(id.clone(), index);

        records.push(MessageRecord {
            id,
            conversation_id,
            conversation_title: conversation_title
                .filter(|title| !title.trim().is_empty())
                .unwrap_or_else(|| cfg.default_title.clone()),
            text,
            created_at,
        });
    }

    report.kept = records.len();
    if report.dropped() > 0 {
        warn!(
            total = report.total,
            kept = report.kept,
            dropped_missing_text = report.dropped_missing_text,
            dropped_duplicate_id = report.dropped_duplicate_id,
            "records dropped during load"
        );
    }
    info!(
        total = report.total,
        kept = report.kept,
        generated_ids = report.generated_ids,
        "records_loaded"
    );

    Ok(LoadedRecords { records, report })
}

fn explicit_id(id: Option<&str>) -> Option<String> {
    id.filter(|id| !id.trim().is_empty()).map(str::to_string)
}

/// `msg_{index}`, suffixed with `_{n}` while that name is already taken.
fn generate_id(index: usize, taken: &mut HashSet<String>) -> String {
    let mut candidate = format!("msg_{index}");
    let mut suffix = 1;
    while taken.contains(&candidate) {
        candidate = format!("msg_{index}_{suffix}");
        suffix += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
