use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::storage::ArtifactStore;
use crate::store::RecordStore;
use crate::types::ConversationStatus;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: RecordStore,
    pub artifacts: ArtifactStore,
}

// Core models for ingestion and annotation

/// One uploaded artifact awaiting validation. Lives only for the duration
/// of a validation + extraction call.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub filename: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub data: bytes::Bytes,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RejectedFile {
    pub filename: String,
    pub reasons: Vec<String>,
}

/// Result of validating an upload batch. A file lands in exactly one of
/// `accepted`/`rejected`; a non-empty `errors` list means the whole batch
/// was refused and `accepted` is empty.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub accepted: Vec<FileCandidate>,
    pub rejected: Vec<RejectedFile>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SheetMetadata {
    pub name: String,
    pub fields: Vec<String>,
    pub types: BTreeMap<String, String>,
    pub row_count: usize,
}

/// Extraction result for a single file: either parsed sheets or an error
/// description, never neither, never both. Use the constructors to keep
/// that invariant.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FileMetadata {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheets: Option<Vec<SheetMetadata>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileMetadata {
    pub fn parsed(filename: &str, sheets: Vec<SheetMetadata>) -> Self {
        Self {
            filename: filename.to_string(),
            sheets: Some(sheets),
            error: None,
        }
    }

    pub fn failed(filename: &str, error: String) -> Self {
        Self {
            filename: filename.to_string(),
            sheets: None,
            error: Some(error),
        }
    }

    /// Column names across all sheets, de-duplicated, first-seen order.
    pub fn merged_fields(&self) -> Vec<String> {
        let mut merged = Vec::new();
        for sheet in self.sheets.iter().flatten() {
            for field in &sheet.fields {
                if !merged.contains(field) {
                    merged.push(field.clone());
                }
            }
        }
        merged
    }

    /// Field -> type tag over all sheets; the first sheet mentioning a
    /// field wins.
    pub fn type_signature(&self) -> BTreeMap<String, String> {
        let mut signature = BTreeMap::new();
        for sheet in self.sheets.iter().flatten() {
            for (field, tag) in &sheet.types {
                signature.entry(field.clone()).or_insert_with(|| tag.clone());
            }
        }
        signature
    }

    pub fn total_row_count(&self) -> usize {
        self.sheets
            .iter()
            .flatten()
            .map(|sheet| sheet.row_count)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HistoryEntry {
    pub step: usize,
    pub prompt: String,
    pub reply: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// The durable, progressively filled-in description of one ingested file.
/// Created once at ingestion; mutated only by the conversation engine.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnnotationRecord {
    pub id: String,
    pub original_filename: String,
    pub artifact_path: PathBuf,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
    pub size_bytes: u64,
    pub fields: Vec<String>,
    pub record_count: usize,
    pub type_signature: BTreeMap<String, String>,
    pub description: String,
    pub confirmed: bool,
    pub process_name: String,
    pub history: Vec<HistoryEntry>,
    pub completed: bool,
}

impl AnnotationRecord {
    /// Seed a record from a freshly extracted file. The identifier is left
    /// empty here; the store allocates it on create.
    pub fn new(
        candidate: &FileCandidate,
        metadata: &FileMetadata,
        artifact_path: &Path,
        uploaded_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            id: String::new(),
            original_filename: candidate.filename.clone(),
            artifact_path: artifact_path.to_path_buf(),
            uploaded_at,
            size_bytes: candidate.size,
            fields: metadata.merged_fields(),
            record_count: metadata.total_row_count(),
            type_signature: metadata.type_signature(),
            description: String::new(),
            confirmed: false,
            process_name: String::new(),
            history: Vec::new(),
            completed: false,
        }
    }
}

// API Request/Response types

#[derive(Debug, serde::Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub accepted_files: Vec<String>,
    pub rejected_files: Vec<RejectedFile>,
    pub errors: Vec<String>,
    pub metadata: Vec<FileMetadata>,
    pub record_ids: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct AdvanceRequest {
    pub record_id: String,
    pub step: usize,
    #[serde(default)]
    pub reply: String,
}

#[derive(Debug, serde::Serialize)]
pub struct AdvanceResponse {
    pub record_id: String,
    pub status: ConversationStatus,
    pub prompt: String,
    pub record: AnnotationRecord,
}

#[derive(Debug, serde::Serialize)]
pub struct RecordSummary {
    pub id: String,
    pub original_filename: String,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
    pub record_count: usize,
    pub completed: bool,
}

impl From<&AnnotationRecord> for RecordSummary {
    fn from(record: &AnnotationRecord) -> Self {
        Self {
            id: record.id.clone(),
            original_filename: record.original_filename.clone(),
            uploaded_at: record.uploaded_at,
            record_count: record.record_count,
            completed: record.completed,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct RecordListResponse {
    pub records: Vec<RecordSummary>,
}

#[derive(Debug, serde::Deserialize)]
pub struct AnalyzeRequest {
    pub message: String,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(name: &str, fields: &[&str], rows: usize) -> SheetMetadata {
        SheetMetadata {
            name: name.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            types: fields
                .iter()
                .map(|f| (f.to_string(), "string".to_string()))
                .collect(),
            row_count: rows,
        }
    }

    #[test]
    fn merged_fields_deduplicate_preserving_first_seen_order() {
        let metadata = FileMetadata::parsed(
            "inventory.xlsx",
            vec![sheet("A", &["Cost", "Qty"], 10), sheet("B", &["Qty", "Region"], 5)],
        );
        assert_eq!(metadata.merged_fields(), vec!["Cost", "Qty", "Region"]);
        assert_eq!(metadata.total_row_count(), 15);
    }

    #[test]
    fn failed_metadata_has_error_and_no_sheets() {
        let metadata = FileMetadata::failed("bad.xlsx", "not a spreadsheet".to_string());
        assert!(metadata.sheets.is_none());
        assert!(metadata.error.is_some());
        assert!(metadata.merged_fields().is_empty());
        assert_eq!(metadata.total_row_count(), 0);
    }

    #[test]
    fn first_sheet_wins_in_type_signature() {
        let mut first = sheet("A", &["Qty"], 1);
        first.types.insert("Qty".to_string(), "integer".to_string());
        let second = sheet("B", &["Qty"], 1);
        let metadata = FileMetadata::parsed("f.xlsx", vec![first, second]);
        assert_eq!(metadata.type_signature()["Qty"], "integer");
    }
}
