//! Annotation record persistence
//!
//! One pretty-printed JSON document per record under `<data_dir>/records/`.
//! Writes go through a temp file and an atomic rename, so a reader never
//! observes a torn record. Every create/update hits the disk before the
//! call returns.
//!
//! Concurrent updates to the same identifier are last-write-wins with a
//! full-record overwrite; the service assumes a single writer per record.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{info, warn};

use crate::models::AnnotationRecord;
use crate::types::{AppError, AppResult};
use crate::utils::sanitize_component;

const RECORDS_DIR: &str = "records";

#[derive(Clone)]
pub struct RecordStore {
    records_dir: PathBuf,
}

impl RecordStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            records_dir: data_dir.join(RECORDS_DIR),
        }
    }

    /// Create the backing directory. Idempotent; call once at startup.
    pub async fn init(&self) -> AppResult<()> {
        fs::create_dir_all(&self.records_dir).await?;
        Ok(())
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.records_dir.join(format!("{id}.json"))
    }

    /// Allocate a unique identifier for the record and persist it. The base
    /// identifier derives from the original filename and upload timestamp;
    /// collisions get a numeric suffix rather than overwriting.
    pub async fn create(&self, mut record: AnnotationRecord) -> AppResult<AnnotationRecord> {
        let stem = record
            .original_filename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&record.original_filename);
        let base = format!(
            "{}_{}",
            sanitize_component(stem),
            record.uploaded_at.format("%Y%m%d%H%M%S")
        );

        let mut id = base.clone();
        let mut attempt = 1;
        while fs::try_exists(self.record_path(&id)).await? {
            id = format!("{base}-{attempt}");
            attempt += 1;
        }

        record.id = id;
        self.write_atomic(&record).await?;
        info!(record_id = %record.id, filename = %record.original_filename, "Created annotation record");
        Ok(record)
    }

    pub async fn read(&self, id: &str) -> AppResult<AnnotationRecord> {
        let path = self.record_path(id);
        if !fs::try_exists(&path).await? {
            return Err(AppError::NotFound(format!(
                "No annotation record with id {id}"
            )));
        }

        let content = fs::read_to_string(&path).await?;
        serde_json::from_str(&content)
            .map_err(|err| AppError::Persistence(format!("Record {id} is unreadable: {err}")))
    }

    /// Read-modify-write. The mutator may refuse the change by returning an
    /// error, in which case nothing is written and the record on disk is
    /// untouched.
    pub async fn update<F>(&self, id: &str, mutator: F) -> AppResult<AnnotationRecord>
    where
        F: FnOnce(&mut AnnotationRecord) -> AppResult<()>,
    {
        let mut record = self.read(id).await?;
        mutator(&mut record)?;
        self.write_atomic(&record).await?;
        Ok(record)
    }

    /// All records, newest first by upload time. An unreadable document is
    /// skipped with a warning rather than failing the listing.
    pub async fn list(&self) -> AppResult<Vec<AnnotationRecord>> {
        let mut records = Vec::new();
        let mut entries = fs::read_dir(&self.records_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path).await?;
            match serde_json::from_str::<AnnotationRecord>(&content) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Skipping unreadable record");
                }
            }
        }

        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(records)
    }

    async fn write_atomic(&self, record: &AnnotationRecord) -> AppResult<()> {
        let path = self.record_path(&record.id);
        let tmp = self.records_dir.join(format!("{}.json.tmp", record.id));

        let content = serde_json::to_string_pretty(record)
            .map_err(|err| AppError::Persistence(format!("Failed to serialize record: {err}")))?;
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
