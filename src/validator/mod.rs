//! Upload policy checks
//!
//! Applies count/size/extension/content-type policy to a candidate batch
//! before any parsing happens. The batch-level count check runs first and
//! short-circuits; per-file checks accumulate reasons so a rejected file
//! reports everything wrong with it at once.

use tracing::{debug, info};

use crate::config::UploadConfig;
use crate::models::{FileCandidate, RejectedFile, ValidationOutcome};

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

pub struct UploadValidator {
    policy: UploadConfig,
}

impl UploadValidator {
    pub fn new(policy: UploadConfig) -> Self {
        Self { policy }
    }

    /// Partition the batch into accepted and rejected candidates. Files are
    /// never silently dropped: every rejection carries its reason list.
    pub fn validate(&self, candidates: Vec<FileCandidate>) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();

        if candidates.len() > self.policy.max_files {
            outcome.errors.push(format!(
                "Maximum {} files allowed per upload, got {}",
                self.policy.max_files,
                candidates.len()
            ));
            return outcome;
        }

        for candidate in candidates {
            let reasons = self.check_file(&candidate);
            if reasons.is_empty() {
                debug!(filename = %candidate.filename, "Candidate accepted");
                outcome.accepted.push(candidate);
            } else {
                info!(filename = %candidate.filename, ?reasons, "Candidate rejected");
                outcome.rejected.push(RejectedFile {
                    filename: candidate.filename,
                    reasons,
                });
            }
        }

        outcome
    }

    fn check_file(&self, candidate: &FileCandidate) -> Vec<String> {
        let mut reasons = Vec::new();

        if candidate.size > self.policy.max_file_size {
            reasons.push(format!(
                "File size {:.1}MiB exceeds {:.0}MiB limit",
                candidate.size as f64 / BYTES_PER_MIB,
                self.policy.max_file_size as f64 / BYTES_PER_MIB,
            ));
        }

        let lowered = candidate.filename.to_lowercase();
        if !self
            .policy
            .allowed_extensions
            .iter()
            .any(|ext| lowered.ends_with(ext.as_str()))
        {
            reasons.push(format!(
                "File must have one of the extensions: {}",
                self.policy.allowed_extensions.join(", ")
            ));
        }

        // Files uploaded via curl or plain forms often declare a generic
        // content type; only a declared, non-generic type is checked.
        if let Some(declared) = &candidate.content_type {
            if declared != mime::APPLICATION_OCTET_STREAM.as_ref()
                && !self
                    .policy
                    .accepted_mime_prefixes
                    .iter()
                    .any(|prefix| declared.starts_with(prefix.as_str()))
            {
                reasons.push(format!(
                    "Content type {declared} is not a recognized spreadsheet type"
                ));
            }
        }

        reasons
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XLSX_MIME: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

    fn policy() -> UploadConfig {
        UploadConfig {
            max_files: 5,
            max_file_size: 50 * 1024 * 1024,
            allowed_extensions: vec![".xlsx".to_string(), ".xls".to_string()],
            accepted_mime_prefixes: vec![
                XLSX_MIME.to_string(),
                "application/vnd.ms-excel".to_string(),
            ],
        }
    }

    fn candidate(filename: &str, size: u64, content_type: Option<&str>) -> FileCandidate {
        FileCandidate {
            filename: filename.to_string(),
            size,
            content_type: content_type.map(|ct| ct.to_string()),
            data: bytes::Bytes::new(),
        }
    }

    #[test]
    fn batch_over_count_limit_is_rejected_wholesale() {
        let validator = UploadValidator::new(policy());
        let batch: Vec<_> = (0..6)
            .map(|i| candidate(&format!("file{i}.xlsx"), 100, Some(XLSX_MIME)))
            .collect();

        let outcome = validator.validate(batch);

        assert!(outcome.accepted.is_empty());
        assert!(outcome.rejected.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("Maximum 5 files"));
    }

    #[test]
    fn oversized_file_reports_computed_mib() {
        let validator = UploadValidator::new(policy());
        let outcome = validator.validate(vec![candidate(
            "big.xlsx",
            60 * 1024 * 1024,
            Some(XLSX_MIME),
        )]);

        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.rejected.len(), 1);
        assert!(outcome.rejected[0].reasons[0].contains("60.0MiB"));
        assert!(outcome.rejected[0].reasons[0].contains("50MiB"));
    }

    #[test]
    fn wrong_extension_and_wrong_mime_accumulate_reasons() {
        let validator = UploadValidator::new(policy());
        let outcome = validator.validate(vec![candidate("notes.txt", 100, Some("text/plain"))]);

        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].reasons.len(), 2);
    }

    #[test]
    fn octet_stream_sentinel_passes_content_type_check() {
        let validator = UploadValidator::new(policy());
        let outcome = validator.validate(vec![candidate(
            "data.xlsx",
            100,
            Some("application/octet-stream"),
        )]);

        assert_eq!(outcome.accepted.len(), 1);
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn undeclared_content_type_is_not_checked() {
        let validator = UploadValidator::new(policy());
        let outcome = validator.validate(vec![candidate("data.xls", 100, None)]);

        assert_eq!(outcome.accepted.len(), 1);
    }

    #[test]
    fn uppercase_extension_is_accepted() {
        let validator = UploadValidator::new(policy());
        let outcome = validator.validate(vec![candidate("REPORT.XLSX", 100, Some(XLSX_MIME))]);

        assert_eq!(outcome.accepted.len(), 1);
    }
}
