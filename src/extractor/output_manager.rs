use crate::config::{Config, DuplicatePolicy};
use crate::error::{Result, UnflattenError};
use crate::extractor::{BlockFailure, ExtractionOutcome, ExtractionProgress, WrittenFile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub input_file: PathBuf,
    pub output_directory: PathBuf,
    pub outcome: ExtractionOutcome,
    pub extraction_summary: ExtractionSummary,
    pub files: Vec<WrittenFile>,
    pub failures: Vec<BlockFailure>,
    pub extraction_time: DateTime<Utc>,
    pub config_used: ConfigSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub blocks_matched: usize,
    pub files_created: usize,
    pub files_failed: usize,
    pub bytes_written: u64,
    pub extraction_duration: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub normalize_newlines: bool,
    pub strict_paths: bool,
    pub on_duplicate: DuplicatePolicy,
}

impl From<&Config> for ConfigSnapshot {
    fn from(config: &Config) -> Self {
        Self {
            normalize_newlines: config.parse.normalize_newlines,
            strict_paths: config.output.strict_paths,
            on_duplicate: config.output.on_duplicate,
        }
    }
}

impl ExtractionReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json_content =
            serde_json::to_string_pretty(self).map_err(|e| UnflattenError::Config {
                message: format!("Failed to serialize report to JSON: {}", e),
            })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json_content)?;

        Ok(())
    }
}

/// Owns the output directory of one run. The directory must be new.
pub struct OutputManager {
    output_directory: PathBuf,
}

impl OutputManager {
    pub fn new<P: Into<PathBuf>>(output_directory: P) -> Self {
        Self {
            output_directory: output_directory.into(),
        }
    }

    /// Fails with `OutputAlreadyExists` if anything is already at the path.
    pub fn check_available(&self) -> Result<()> {
        // symlink_metadata also catches dangling symlinks
        if self.output_directory.symlink_metadata().is_ok() {
            return Err(UnflattenError::OutputAlreadyExists {
                path: self.output_directory.display().to_string(),
            });
        }
        Ok(())
    }

    pub fn initialize(&self) -> Result<()> {
        self.check_available()?;
        fs::create_dir_all(&self.output_directory)?;
        log::debug!("created output directory {}", self.output_directory.display());
        Ok(())
    }

    pub fn get_output_directory(&self) -> &Path {
        &self.output_directory
    }

    pub fn create_extraction_report(
        &self,
        input_file: &Path,
        progress: &ExtractionProgress,
        config: &ConfigSnapshot,
    ) -> ExtractionReport {
        ExtractionReport {
            input_file: input_file.to_path_buf(),
            output_directory: self.output_directory.clone(),
            outcome: progress.outcome(),
            extraction_summary: ExtractionSummary {
                blocks_matched: progress.blocks_matched,
                files_created: progress.files_created,
                files_failed: progress.failures.len(),
                bytes_written: progress.bytes_written,
                extraction_duration: progress.elapsed(),
            },
            files: progress.created.clone(),
            failures: progress.failures.clone(),
            extraction_time: Utc::now(),
            config_used: config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_initialize_creates_fresh_directory() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("nested").join("out");

        let manager = OutputManager::new(&output);
        manager.initialize().unwrap();

        assert!(output.is_dir());
        assert_eq!(manager.get_output_directory(), output.as_path());
    }

    #[test]
    fn test_existing_directory_is_refused() {
        let temp_dir = TempDir::new().unwrap();
        let marker = temp_dir.path().join("keep.txt");
        fs::write(&marker, "untouched").unwrap();

        let manager = OutputManager::new(temp_dir.path());
        let err = manager.initialize().unwrap_err();

        assert!(matches!(err, UnflattenError::OutputAlreadyExists { .. }));
        assert_eq!(fs::read_to_string(marker).unwrap(), "untouched");
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_existing_file_is_refused() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("out");
        fs::write(&file, "").unwrap();

        assert!(OutputManager::new(&file).check_available().is_err());
    }

    #[test]
    fn test_report_creation_and_saving() {
        let temp_dir = TempDir::new().unwrap();
        let manager = OutputManager::new(temp_dir.path().join("out"));

        let mut progress = ExtractionProgress::new();
        progress.blocks_matched = 2;
        progress.record_created(WrittenFile {
            relative_path: "a.txt".to_string(),
            destination: temp_dir.path().join("out").join("a.txt"),
            bytes: 5,
        });
        progress.record_failure(BlockFailure {
            relative_path: "b.txt".to_string(),
            destination: temp_dir.path().join("out").join("b.txt"),
            reason: "denied".to_string(),
        });

        let snapshot = ConfigSnapshot::from(&Config::default());
        let report = manager.create_extraction_report(Path::new("combined.txt"), &progress, &snapshot);

        assert_eq!(report.outcome, ExtractionOutcome::CompletedWithFiles(1));
        assert_eq!(report.extraction_summary.files_failed, 1);
        assert!(report.has_failures());

        let report_path = temp_dir.path().join("reports").join("run.json");
        report.save_to_file(&report_path).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(report_path).unwrap()).unwrap();
        assert_eq!(saved["extraction_summary"]["files_created"], 1);
        assert_eq!(saved["outcome"]["status"], "completed_with_files");
        assert_eq!(saved["config_used"]["on_duplicate"], "overwrite");
    }
}
