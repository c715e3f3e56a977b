use crate::error::{UnflattenError, UserFriendlyError};
use crate::extractor::{BlockEvent, ExtractionProgress, ExtractionReport, PlannedFile};
use crate::ui::progress::format_duration;
use console::{style, Emoji, Term};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
    silent: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
            silent: false,
        }
    }

    /// Prints nothing at all, errors and per-block failures included.
    pub fn silent() -> Self {
        Self {
            silent: true,
            ..Self::new(OutputMode::Plain, 0, true)
        }
    }

    /// Errors are printed even in quiet mode.
    pub fn error(&self, message: &str) {
        if self.silent {
            return;
        }

        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => println!("ERROR: {}", message),
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &UnflattenError) {
        if self.silent {
            return;
        }

        self.error(&error.user_message());

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        println!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    println!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    /// One line per block: `[OK] Created: <path>` or `[ERROR] ...`.
    pub fn print_block_event(&self, event: &BlockEvent) {
        if self.silent {
            return;
        }

        match (self.mode, event) {
            (OutputMode::Json, BlockEvent::Created(file)) => {
                if self.should_show_message(0) {
                    self.print_json_object(&serde_json::json!({
                        "type": "block",
                        "status": "created",
                        "path": file.relative_path,
                        "destination": file.destination,
                        "bytes": file.bytes
                    }));
                }
            }
            (OutputMode::Json, BlockEvent::Failed(failure)) => {
                self.print_json_object(&serde_json::json!({
                    "type": "block",
                    "status": "failed",
                    "path": failure.relative_path,
                    "destination": failure.destination,
                    "reason": failure.reason
                }));
            }
            (_, BlockEvent::Created(file)) => {
                if self.should_show_message(0) {
                    let tag = if self.use_colors {
                        style("[OK]").green().bold().to_string()
                    } else {
                        "[OK]".to_string()
                    };
                    println!("  {} Created: {}", tag, file.destination.display());
                }
            }
            (_, BlockEvent::Failed(failure)) => {
                let tag = if self.use_colors {
                    style("[ERROR]").red().bold().to_string()
                } else {
                    "[ERROR]".to_string()
                };
                println!(
                    "  {} Failed to create file {}: {}",
                    tag,
                    failure.destination.display(),
                    failure.reason
                );
            }
        }
    }

    pub fn print_extraction_summary(&self, progress: &ExtractionProgress) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human | OutputMode::Plain => self.print_text_summary(progress),
            OutputMode::Json => self.print_json_summary(progress),
        }
    }

    pub fn print_extraction_report(&self, report: &ExtractionReport) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Json => match serde_json::to_value(report) {
                Ok(mut value) => {
                    value["type"] = "report".into();
                    self.print_json_object(&value);
                }
                Err(e) => log::warn!("could not serialize extraction report: {}", e),
            },
            OutputMode::Human | OutputMode::Plain => {
                if self.should_show_message(1) {
                    self.print_text_report(report);
                }
            }
        }
    }

    pub fn print_plan(&self, plan: &[PlannedFile]) {
        if self.silent {
            return;
        }

        match self.mode {
            OutputMode::Json => {
                let entries: Vec<_> = plan
                    .iter()
                    .map(|entry| {
                        serde_json::json!({
                            "path": entry.relative_path,
                            "destination": entry.destination,
                            "bytes": entry.bytes,
                            "problem": entry.problem
                        })
                    })
                    .collect();
                self.print_json_object(&serde_json::json!({
                    "type": "plan",
                    "files": entries
                }));
            }
            OutputMode::Human | OutputMode::Plain => {
                for entry in plan {
                    match entry.problem {
                        Some(ref problem) => println!(
                            "  [SKIP] {} ({})",
                            entry.destination.display(),
                            problem
                        ),
                        None => println!(
                            "  [PLAN] {} ({} bytes)",
                            entry.destination.display(),
                            entry.bytes
                        ),
                    }
                }
            }
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => {
                println!("{}", "-".repeat(60));
            }
            OutputMode::Json => {} // No separator in JSON mode
        }
    }

    // Private helper methods
    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && !self.silent && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        #[allow(clippy::type_complexity)]
        let (emoji, color_fn): (Emoji, Box<dyn Fn(&str) -> console::StyledObject<&str>>) =
            match msg_type {
                MessageType::Error => (CROSS, Box::new(|msg| style(msg).red().bold())),
                MessageType::Info => (INFO, Box::new(|msg| style(msg).cyan())),
            };

        if self.use_colors {
            println!("{}{}", emoji, color_fn(message));
        } else {
            let prefix = match msg_type {
                MessageType::Error => "✗",
                MessageType::Info => "i",
            };
            println!("{} {}", prefix, message);
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_text_summary(&self, progress: &ExtractionProgress) {
        println!();
        if progress.blocks_matched == 0 {
            println!("No files were found in the input file to recreate.");
        } else if self.use_colors {
            println!(
                "{} {}",
                style(format!(
                    "Successfully recreated {} files.",
                    progress.files_created
                ))
                .green()
                .bold(),
                CHECKMARK
            );
        } else {
            println!("Successfully recreated {} files.", progress.files_created);
        }

        if progress.has_failures() {
            let line = format!("Failed to create {} files.", progress.failures.len());
            if self.use_colors {
                println!("{}", style(line).red().bold());
            } else {
                println!("{}", line);
            }
        }

        if self.should_show_message(1) {
            println!("  Bytes written: {}", format_bytes(progress.bytes_written));
            println!("  Time taken:    {}", format_duration(progress.elapsed()));
        }
    }

    fn print_json_summary(&self, progress: &ExtractionProgress) {
        let summary = serde_json::json!({
            "type": "summary",
            "blocks_matched": progress.blocks_matched,
            "files_created": progress.files_created,
            "files_failed": progress.failures.len(),
            "bytes_written": progress.bytes_written,
            "duration_ms": progress.elapsed().as_millis(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        self.print_json_object(&summary);
    }

    fn print_text_report(&self, report: &ExtractionReport) {
        self.print_separator();
        println!("Input:  {}", report.input_file.display());
        println!("Output: {}", report.output_directory.display());
        println!(
            "Extracted at: {}",
            report.extraction_time.format("%Y-%m-%d %H:%M UTC")
        );

        if report.has_failures() {
            println!("Issues encountered:");
            for failure in &report.failures {
                println!("  - {}: {}", failure.relative_path, failure.reason);
            }
        }
        self.print_separator();
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Error,
    Info,
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
