//! Final assembly and atomic JSON write.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use attribution::Color;
use ingest::MessageRecord;
use projection::SpatialPoint;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{error, info};

pub const DEFAULT_MAX_TEXT_LENGTH: usize = 500;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExportError {
    #[error("cannot assemble output: {records} records but {points} positions, {colors} colors, {sizes} sizes")]
    LengthMismatch {
        records: usize,
        points: usize,
        colors: usize,
        sizes: usize,
    },

    #[error("failed to serialize galaxy: {0}")]
    Serialize(String),

    #[error("failed to write {path}: {reason}")]
    Io { path: String, reason: String },
}

impl ExportError {
    fn io(path: &Path, err: impl std::fmt::Display) -> Self {
        ExportError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Cap on exported text, counted in Unicode scalar values.
    pub max_text_length: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }
}

/// One rendered point of the galaxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalaxyPoint {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub color: Color,
    pub text: String,
    pub title: String,
    pub timestamp: Option<f64>,
    pub size: f64,
}

/// What [`write_galaxy`] put on disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub points: usize,
    pub bytes: u64,
}

/// First `max_chars` characters of `text`. No word-boundary handling.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Zips per-record stage outputs into [`GalaxyPoint`]s, index by index.
///
/// `texts` must already be truncated; the caller sizes points from the same
/// strings.
pub fn assemble_points(
    records: &[MessageRecord],
    texts: Vec<String>,
    positions: &[SpatialPoint],
    colors: Vec<Color>,
    sizes: &[f64],
) -> Result<Vec<GalaxyPoint>, ExportError> {
    let n = records.len();
    if positions.len() != n || colors.len() != n || sizes.len() != n || texts.len() != n {
        return Err(ExportError::LengthMismatch {
            records: n,
            points: positions.len(),
            colors: colors.len(),
            sizes: sizes.len(),
        });
    }

    Ok(records
        .iter()
        .zip(texts)
        .zip(positions)
        .zip(colors)
        .zip(sizes)
        .map(|((((record, text), pos), color), &size)| GalaxyPoint {
            id: record.id.clone(),
            x: pos.x,
            y: pos.y,
            z: pos.z,
            color,
            text,
            title: record.conversation_title.clone(),
            timestamp: record.created_at,
            size,
        })
        .collect())
}

/// Writes `points` as a pretty JSON array to `path`.
///
/// The bytes go to a temporary file next to `path` that is renamed over it
/// once fully flushed; on any failure the temporary file is removed and the
/// previous contents of `path` (if any) stay untouched.
pub fn write_galaxy(path: &Path, points: &[GalaxyPoint]) -> Result<ExportSummary, ExportError> {
    let start = Instant::now();
    let result = write_atomic(path, points);
    let elapsed_micros = start.elapsed().as_micros() as u64;

    match &result {
        Ok(summary) => info!(
            path = %summary.path.display(),
            points = summary.points,
            bytes = summary.bytes,
            elapsed_micros,
            "galaxy_written"
        ),
        Err(err) => error!(
            path = %path.display(),
            error = %err,
            elapsed_micros,
            "galaxy_write_failed"
        ),
    }
    result
}

fn write_atomic(path: &Path, points: &[GalaxyPoint]) -> Result<ExportSummary, ExportError> {
    let bytes =
        serde_json::to_vec_pretty(points).map_err(|err| ExportError::Serialize(err.to_string()))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|err| ExportError::io(&dir, err))?;

    let mut tmp = NamedTempFile::new_in(&dir).map_err(|err| ExportError::io(&dir, err))?;
    tmp.write_all(&bytes)
        .map_err(|err| ExportError::io(tmp.path(), err))?;
    tmp.as_file()
        .sync_all()
        .map_err(|err| ExportError::io(tmp.path(), err))?;
    tmp.persist(path)
        .map_err(|err| ExportError::io(path, err.error))?;

    Ok(ExportSummary {
        path: path.to_path_buf(),
        points: points.len(),
        bytes: bytes.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, text: &str) -> MessageRecord {
        MessageRecord {
            id: id.into(),
            conversation_id: None,
            conversation_title: "Chat".into(),
            text: text.into(),
            created_at: Some(1_700_000_000.5),
        }
    }

    fn color(hex: &str) -> Color {
        Color::parse(hex).unwrap()
    }

    #[test]
    fn truncation_is_exact_at_the_cap() {
        let text = "a".repeat(600);
        assert_eq!(truncate_text(&text, 500).chars().count(), 500);
        assert_eq!(truncate_text("short", 500), "short");
        assert_eq!(truncate_text("exact", 5), "exact");
        assert_eq!(truncate_text("héllo wörld", 4), "héll");
        assert_eq!(truncate_text("🚀🚀🚀", 2), "🚀🚀");
    }

    #[test]
    fn assembles_points_in_record_order() {
        let records = vec![record("a", "one"), record("b", "two")];
        let points = assemble_points(
            &records,
            vec!["one".into(), "two".into()],
            &[SpatialPoint::new(1.0, 2.0, 3.0), SpatialPoint::new(4.0, 5.0, 6.0)],
            vec![color("#FF1744"), color("#00E5FF")],
            &[8.0, 12.0],
        )
        .unwrap();
        assert_eq!(points[0].id, "a");
        assert_eq!(points[1].id, "b");
        assert_eq!(points[1].x, 4.0);
        assert_eq!(points[1].color.as_str(), "#00E5FF");
        assert_eq!(points[0].timestamp, Some(1_700_000_000.5));
        assert_eq!(points[1].size, 12.0);
    }

    #[test]
    fn assembly_rejects_mismatched_lengths() {
        let records = vec![record("a", "one"), record("b", "two")];
        let err = assemble_points(
            &records,
            vec!["one".into(), "two".into()],
            &[SpatialPoint::new(0.0, 0.0, 0.0)],
            vec![color("#FF1744"), color("#00E5FF")],
            &[8.0, 8.0],
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::LengthMismatch { points: 1, .. }));
    }

    #[test]
    fn writes_pretty_json_and_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/galaxy.json");
        let records = vec![record("a", "naïve ☕")];
        let points = assemble_points(
            &records,
            vec!["naïve ☕".into()],
            &[SpatialPoint::new(0.5, -0.5, 0.0)],
            vec![color("#FF1744")],
            &[8.0],
        )
        .unwrap();

        let summary = write_galaxy(&path, &points).unwrap();
        assert_eq!(summary.points, 1);

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written.len() as u64, summary.bytes);
        assert!(written.starts_with("[\n  {\n    \"id\": \"a\""));
        assert!(written.contains("naïve ☕"));

        let parsed: Vec<GalaxyPoint> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, points);
    }

    #[test]
    fn missing_timestamp_is_null() {
        let mut rec = record("a", "x");
        rec.created_at = None;
        let points = assemble_points(
            &[rec],
            vec!["x".into()],
            &[SpatialPoint::new(0.0, 0.0, 0.0)],
            vec![color("#FF1744")],
            &[8.0],
        )
        .unwrap();
        let json = serde_json::to_string(&points).unwrap();
        assert!(json.contains("\"timestamp\":null"));
    }

    #[test]
    fn overwrites_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("galaxy.json");
        fs::write(&path, "stale").unwrap();

        write_galaxy(&path, &[]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn failed_write_leaves_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();
        let path = blocker.join("galaxy.json");

        let err = write_galaxy(&path, &[]).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
        assert!(!path.exists());
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
