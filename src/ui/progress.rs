use crate::extractor::BlockEvent;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct ProgressManager {
    multi_progress: MultiProgress,
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            enabled,
        }
    }

    /// Blocks are discovered lazily, so there is no total to show a bar against.
    pub fn create_block_progress(&self) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi_progress.add(ProgressBar::new_spinner());
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {pos} blocks {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        pb.set_message("Scanning combined file...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn suspend<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if self.enabled {
            self.multi_progress.suspend(f)
        } else {
            f()
        }
    }

    pub fn clear(&self) {
        if self.enabled {
            self.multi_progress.clear().ok();
        }
    }
}

pub fn update_block_progress(pb: &ProgressBar, event: &BlockEvent) {
    pb.inc(1);
    match event {
        BlockEvent::Created(file) => pb.set_message(format!("Wrote {}", file.relative_path)),
        BlockEvent::Failed(failure) => pb.set_message(format!("Failed {}", failure.relative_path)),
    }
}

pub fn finish_progress_with_summary(pb: &ProgressBar, message: &str, duration: Duration) {
    let final_message = format!("{} (completed in {})", message, format_duration(duration));
    pb.finish_with_message(final_message);
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{BlockFailure, WrittenFile};
    use std::path::PathBuf;

    #[test]
    fn test_disabled_progress_is_hidden() {
        let manager = ProgressManager::new(false);
        let pb = manager.create_block_progress();
        assert!(pb.is_hidden());
        assert_eq!(manager.suspend(|| 7), 7);
    }

    #[test]
    fn test_block_progress_counts_events() {
        let manager = ProgressManager::new(false);
        let pb = manager.create_block_progress();

        update_block_progress(
            &pb,
            &BlockEvent::Created(WrittenFile {
                relative_path: "a.txt".to_string(),
                destination: PathBuf::from("out/a.txt"),
                bytes: 1,
            }),
        );
        update_block_progress(
            &pb,
            &BlockEvent::Failed(BlockFailure {
                relative_path: "b.txt".to_string(),
                destination: PathBuf::from("out/b.txt"),
                reason: "denied".to_string(),
            }),
        );

        assert_eq!(pb.position(), 2);
        assert_eq!(pb.message(), "Failed b.txt");
        finish_progress_with_summary(&pb, "done", Duration::from_millis(3));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
    }
}
