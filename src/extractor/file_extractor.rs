use crate::config::DuplicatePolicy;
use crate::error::{Result, UnflattenError, UserFriendlyError};
use crate::parser::{escapes_root, is_current_dir, normalize_relative_path, FileBlock};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenFile {
    pub relative_path: String,
    pub destination: PathBuf,
    pub bytes: u64,
}

/// A block that could not be written. Recorded, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockFailure {
    pub relative_path: String,
    pub destination: PathBuf,
    pub reason: String,
}

/// Where a block would go in a dry run, and why it would fail if it would.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedFile {
    pub relative_path: String,
    pub destination: PathBuf,
    pub bytes: u64,
    pub problem: Option<String>,
}

#[derive(Debug, Clone)]
pub enum BlockEvent {
    Created(WrittenFile),
    Failed(BlockFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "files", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    CompletedWithFiles(usize),
    CompletedWithNoMatches,
}

#[derive(Debug, Clone)]
pub struct ExtractionProgress {
    pub blocks_matched: usize,
    pub files_created: usize,
    pub bytes_written: u64,
    pub created: Vec<WrittenFile>,
    pub failures: Vec<BlockFailure>,
    pub start_time: Instant,
}

impl ExtractionProgress {
    pub fn new() -> Self {
        Self {
            blocks_matched: 0,
            files_created: 0,
            bytes_written: 0,
            created: Vec::new(),
            failures: Vec::new(),
            start_time: Instant::now(),
        }
    }

    pub fn record_created(&mut self, file: WrittenFile) {
        self.files_created += 1;
        self.bytes_written += file.bytes;
        self.created.push(file);
    }

    pub fn record_failure(&mut self, failure: BlockFailure) {
        self.failures.push(failure);
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn outcome(&self) -> ExtractionOutcome {
        if self.blocks_matched == 0 {
            ExtractionOutcome::CompletedWithNoMatches
        } else {
            ExtractionOutcome::CompletedWithFiles(self.files_created)
        }
    }
}

impl Default for ExtractionProgress {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FileOperations {
    strict_paths: bool,
    duplicate_policy: DuplicatePolicy,
    buffer_size: usize,
}

impl FileOperations {
    pub fn new() -> Self {
        Self {
            strict_paths: false,
            duplicate_policy: DuplicatePolicy::Overwrite,
            buffer_size: 64 * 1024, // 64KB buffer
        }
    }

    pub fn with_strict_paths(mut self, strict: bool) -> Self {
        self.strict_paths = strict;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Writes every block under `output_root`, in order.
    ///
    /// A failing block is recorded and reported through `event_callback`;
    /// the remaining blocks are still processed.
    pub fn extract_blocks<'a, I>(
        &self,
        blocks: I,
        output_root: &Path,
        event_callback: Option<&dyn Fn(&BlockEvent)>,
    ) -> ExtractionProgress
    where
        I: IntoIterator<Item = FileBlock<'a>>,
    {
        let mut progress = ExtractionProgress::new();
        let mut written: HashSet<PathBuf> = HashSet::new();

        for block in blocks {
            progress.blocks_matched += 1;

            let destination = output_root.join(normalize_relative_path(block.raw_path));
            let result = if written.contains(&destination) {
                match self.duplicate_policy {
                    DuplicatePolicy::Error => Err(UnflattenError::DuplicatePath {
                        path: destination.display().to_string(),
                    }),
                    DuplicatePolicy::Overwrite => {
                        log::warn!(
                            "block '{}' overwrites {}",
                            block.relative_path(),
                            destination.display()
                        );
                        self.write_block(&block, output_root)
                    }
                }
            } else {
                self.write_block(&block, output_root)
            };

            let event = match result {
                Ok(file) => {
                    written.insert(file.destination.clone());
                    progress.record_created(file.clone());
                    BlockEvent::Created(file)
                }
                Err(e) => {
                    let failure = BlockFailure {
                        relative_path: block.relative_path().to_string(),
                        destination,
                        reason: failure_reason(&e),
                    };
                    log::debug!("block '{}' failed: {}", failure.relative_path, e);
                    progress.record_failure(failure.clone());
                    BlockEvent::Failed(failure)
                }
            };

            if let Some(callback) = event_callback {
                callback(&event);
            }
        }

        progress
    }

    pub fn plan_blocks<'a, I>(&self, blocks: I, output_root: &Path) -> Vec<PlannedFile>
    where
        I: IntoIterator<Item = FileBlock<'a>>,
    {
        let mut seen: HashSet<PathBuf> = HashSet::new();

        blocks
            .into_iter()
            .map(|block| {
                let fallback = output_root.join(normalize_relative_path(block.raw_path));
                let (destination, problem) = match self.resolve_destination(&block, output_root) {
                    Ok(destination) => {
                        let problem = (!seen.insert(destination.clone())
                            && self.duplicate_policy == DuplicatePolicy::Error)
                            .then(|| format!("Duplicate destination path: {}", destination.display()));
                        (destination, problem)
                    }
                    Err(e) => (fallback, Some(failure_reason(&e))),
                };

                PlannedFile {
                    relative_path: block.relative_path().to_string(),
                    destination,
                    bytes: block.size(),
                    problem,
                }
            })
            .collect()
    }

    /// Resolves where a block would be written, without touching the disk.
    pub fn resolve_destination(&self, block: &FileBlock<'_>, output_root: &Path) -> Result<PathBuf> {
        let relative = normalize_relative_path(block.raw_path);

        if is_current_dir(&relative) {
            return Err(UnflattenError::InvalidPath {
                path: format!("empty file path in block '{}'", block.raw_path),
            });
        }

        if self.strict_paths && escapes_root(&relative) {
            return Err(UnflattenError::UnsafePath {
                path: relative.display().to_string(),
            });
        }

        Ok(output_root.join(relative))
    }

    pub fn write_block(&self, block: &FileBlock<'_>, output_root: &Path) -> Result<WrittenFile> {
        let destination = self.resolve_destination(block, output_root)?;

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        let bytes = self.write_content(&destination, block.content)?;

        Ok(WrittenFile {
            relative_path: block.relative_path().to_string(),
            destination,
            bytes,
        })
    }

    fn write_content(&self, destination: &Path, content: &str) -> Result<u64> {
        let file = fs::File::create(destination)?;
        let mut writer = BufWriter::with_capacity(self.buffer_size, file);

        writer.write_all(content.as_bytes())?;
        writer.flush()?;

        Ok(content.len() as u64)
    }
}

impl Default for FileOperations {
    fn default() -> Self {
        Self::new()
    }
}

fn failure_reason(error: &UnflattenError) -> String {
    match error {
        UnflattenError::Io(inner) => inner.to_string(),
        other => other.user_message(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{render_document, BlockParser};
    use std::cell::RefCell;
    use tempfile::TempDir;

    fn extract(document: &str, operations: &FileOperations, root: &Path) -> ExtractionProgress {
        let parser = BlockParser::new().unwrap();
        operations.extract_blocks(parser.blocks(document), root, None)
    }

    #[test]
    fn test_block_extraction() {
        let dest_dir = TempDir::new().unwrap();
        let document = render_document(&[
            ("src/main.go", "package main"),
            ("README.md", "Hello world"),
        ]);

        let progress = extract(&document, &FileOperations::new(), dest_dir.path());

        assert_eq!(progress.blocks_matched, 2);
        assert_eq!(progress.files_created, 2);
        assert_eq!(progress.bytes_written, 23);
        assert!(!progress.has_failures());
        assert_eq!(progress.outcome(), ExtractionOutcome::CompletedWithFiles(2));
        assert_eq!(
            fs::read_to_string(dest_dir.path().join("src").join("main.go")).unwrap(),
            "package main"
        );
        assert_eq!(
            fs::read_to_string(dest_dir.path().join("README.md")).unwrap(),
            "Hello world"
        );
    }

    #[test]
    fn test_no_matches_outcome() {
        let dest_dir = TempDir::new().unwrap();
        let progress = extract("nothing to see here", &FileOperations::new(), dest_dir.path());

        assert_eq!(progress.outcome(), ExtractionOutcome::CompletedWithNoMatches);
        assert_eq!(fs::read_dir(dest_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_duplicate_last_write_wins() {
        let dest_dir = TempDir::new().unwrap();
        let document = render_document(&[("a/b.txt", "first"), ("a/./b.txt", "second")]);

        let progress = extract(&document, &FileOperations::new(), dest_dir.path());

        assert_eq!(progress.files_created, 2);
        assert_eq!(
            fs::read_to_string(dest_dir.path().join("a").join("b.txt")).unwrap(),
            "second"
        );
    }

    #[test]
    fn test_duplicate_error_policy() {
        let dest_dir = TempDir::new().unwrap();
        let document = render_document(&[("b.txt", "first"), ("b.txt", "second")]);
        let operations = FileOperations::new().with_duplicate_policy(DuplicatePolicy::Error);

        let progress = extract(&document, &operations, dest_dir.path());

        assert_eq!(progress.files_created, 1);
        assert_eq!(progress.failures.len(), 1);
        assert!(progress.failures[0].reason.contains("Duplicate"));
        assert_eq!(fs::read_to_string(dest_dir.path().join("b.txt")).unwrap(), "first");
    }

    #[test]
    fn test_failed_block_does_not_stop_run() {
        let dest_dir = TempDir::new().unwrap();
        // "blocker" becomes a file, so "blocker/inner.txt" cannot get a parent directory.
        let document = render_document(&[
            ("blocker", "plain file"),
            ("blocker/inner.txt", "unreachable"),
            ("   ", "no path"),
            ("after.txt", "still written"),
        ]);

        let progress = extract(&document, &FileOperations::new(), dest_dir.path());

        assert_eq!(progress.blocks_matched, 4);
        assert_eq!(progress.files_created, 2);
        assert_eq!(progress.failures.len(), 2);
        assert_eq!(progress.failures[0].relative_path, "blocker/inner.txt");
        assert!(progress.failures[1].reason.contains("empty file path"));
        assert!(dest_dir.path().join("after.txt").exists());
    }

    #[test]
    fn test_strict_paths_rejects_escape() {
        let root = TempDir::new().unwrap();
        let output = root.path().join("out");
        fs::create_dir(&output).unwrap();
        let document = render_document(&[("../escaped.txt", "x"), ("inside.txt", "y")]);

        let strict = FileOperations::new().with_strict_paths(true);
        let progress = extract(&document, &strict, &output);

        assert_eq!(progress.files_created, 1);
        assert_eq!(progress.failures.len(), 1);
        assert!(!root.path().join("escaped.txt").exists());
        assert!(output.join("inside.txt").exists());
    }

    #[test]
    fn test_default_allows_parent_segments() {
        let root = TempDir::new().unwrap();
        let output = root.path().join("out");
        fs::create_dir(&output).unwrap();
        let document = render_document(&[("../sibling.txt", "outside")]);

        let progress = extract(&document, &FileOperations::new(), &output);

        assert_eq!(progress.files_created, 1);
        assert_eq!(
            fs::read_to_string(root.path().join("sibling.txt")).unwrap(),
            "outside"
        );
    }

    #[test]
    fn test_event_callback_order() {
        let dest_dir = TempDir::new().unwrap();
        let document = render_document(&[("one.txt", "1"), ("", "bad"), ("two.txt", "2")]);
        let parser = BlockParser::new().unwrap();
        let seen = RefCell::new(Vec::new());

        let callback = |event: &BlockEvent| {
            let label = match event {
                BlockEvent::Created(file) => format!("ok:{}", file.relative_path),
                BlockEvent::Failed(failure) => format!("err:{}", failure.relative_path),
            };
            seen.borrow_mut().push(label);
        };

        FileOperations::new().extract_blocks(parser.blocks(&document), dest_dir.path(), Some(&callback));

        assert_eq!(*seen.borrow(), vec!["ok:one.txt", "err:", "ok:two.txt"]);
    }

    #[test]
    fn test_plan_blocks_touches_nothing() {
        let root = TempDir::new().unwrap();
        let output = root.path().join("out");
        let parser = BlockParser::new().unwrap();
        let document = render_document(&[("a.txt", "abc"), ("a.txt", "again"), ("../x", "x")]);

        let operations = FileOperations::new()
            .with_strict_paths(true)
            .with_duplicate_policy(DuplicatePolicy::Error);
        let plan = operations.plan_blocks(parser.blocks(&document), &output);

        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].bytes, 3);
        assert!(plan[0].problem.is_none());
        assert!(plan[1].problem.as_deref().unwrap().contains("Duplicate"));
        assert!(plan[2].problem.as_deref().unwrap().contains("outside"));
        assert!(!output.exists());
    }

    #[test]
    fn test_resolve_destination() {
        let parser = BlockParser::new().unwrap();
        let document = render_document(&[("docs\\guide.md", "g")]);
        let block = parser.blocks(&document).next().unwrap();

        let destination = FileOperations::new()
            .resolve_destination(&block, Path::new("out"))
            .unwrap();
        assert_eq!(destination, Path::new("out").join("docs").join("guide.md"));
    }
}
