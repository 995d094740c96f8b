// src/metadata.rs

use crate::error::AppError;
use chrono::NaiveDateTime;
use serde_json::Value;
use std::path::PathBuf;

/// One file's attributes as reported by a metadata source, keyed by exiftool tag names.
pub type MetadataRecord = serde_json::Map<String, Value>;

pub const SOURCE_FILE: &str = "SourceFile";
pub const IMAGE_WIDTH: &str = "ImageWidth";
pub const IMAGE_HEIGHT: &str = "ImageHeight";

/// Capture-time tags, most trustworthy first.
pub const DATE_CANDIDATES: [&str; 3] = ["DateTimeOriginal", "CreateDate", "ModifyDate"];

/// exiftool format: "2023:07:28 14:05:01"
pub const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRecord {
    pub source: PathBuf,
    pub date_taken: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl PhotoRecord {
    pub fn from_metadata(record: &MetadataRecord) -> Result<Self, AppError> {
        let source = record
            .get(SOURCE_FILE)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::skipped("unknown", "record has no SourceFile"))?;

        let date_taken = DATE_CANDIDATES
            .iter()
            .find_map(|key| record.get(*key).and_then(text_value));

        Ok(PhotoRecord {
            source: PathBuf::from(source),
            date_taken,
            width: record.get(IMAGE_WIDTH).and_then(dimension_value),
            height: record.get(IMAGE_HEIGHT).and_then(dimension_value),
        })
    }

    pub fn display_path(&self) -> String {
        self.source.display().to_string()
    }

    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.source.file_name()
    }

    /// Parses the selected capture time. A missing or malformed date is a per-record skip.
    pub fn capture_time(&self) -> Result<NaiveDateTime, AppError> {
        let raw = self
            .date_taken
            .as_deref()
            .ok_or_else(|| AppError::skipped(self.display_path(), "no date found"))?;

        NaiveDateTime::parse_from_str(raw, EXIF_DATE_FORMAT).map_err(|e| {
            AppError::skipped(
                self.display_path(),
                format!("date {:?} does not match YYYY:MM:DD HH:MM:SS ({})", raw, e),
            )
        })
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some((w, h)),
            _ => None,
        }
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn dimension_value(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    u32::try_from(n).ok().filter(|n| *n > 0)
}
