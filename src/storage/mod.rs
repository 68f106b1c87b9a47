//! Uploaded artifact storage
//!
//! Raw upload bytes land under `<data_dir>/uploads/` at a path derived from
//! the upload timestamp and the sanitized original name, so two uploads of
//! the same file never collide. The stored path goes into the annotation
//! record's provenance.
//!
//! There is no compensating delete if the record write that follows an
//! artifact write fails; the orphaned artifact is logged and left behind.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::debug;

use crate::types::AppResult;
use crate::utils::sanitize_component;

const UPLOADS_DIR: &str = "uploads";

#[derive(Clone)]
pub struct ArtifactStore {
    uploads_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            uploads_dir: data_dir.join(UPLOADS_DIR),
        }
    }

    /// Create the backing directory. Idempotent; call once at startup.
    pub async fn init(&self) -> AppResult<()> {
        fs::create_dir_all(&self.uploads_dir).await?;
        Ok(())
    }

    /// Durably write the uploaded bytes and return the stored path.
    pub async fn save(
        &self,
        original_name: &str,
        uploaded_at: DateTime<Utc>,
        data: &[u8],
    ) -> AppResult<PathBuf> {
        let stamped = format!(
            "{}_{}",
            uploaded_at.format("%Y%m%d%H%M%S"),
            sanitize_component(original_name)
        );

        let mut path = self.uploads_dir.join(&stamped);
        let mut attempt = 1;
        while fs::try_exists(&path).await? {
            path = self.uploads_dir.join(format!("{stamped}-{attempt}"));
            attempt += 1;
        }

        fs::write(&path, data).await?;
        debug!(path = %path.display(), bytes = data.len(), "Stored uploaded artifact");
        Ok(path)
    }

    pub async fn load(&self, path: &Path) -> AppResult<Vec<u8>> {
        Ok(fs::read(path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.init().await.unwrap();
        let when = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();

        let path = store.save("sales report.xlsx", when, b"workbook bytes").await.unwrap();

        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("20240301093000_"));
        assert_eq!(store.load(&path).await.unwrap(), b"workbook bytes");
    }

    #[tokio::test]
    async fn same_name_and_timestamp_get_distinct_paths() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.init().await.unwrap();
        let when = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();

        let first = store.save("sales.xlsx", when, b"one").await.unwrap();
        let second = store.save("sales.xlsx", when, b"two").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.load(&first).await.unwrap(), b"one");
        assert_eq!(store.load(&second).await.unwrap(), b"two");
    }
}
