pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod parser;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, DuplicatePolicy, OutputConfig, ParseConfig};
pub use error::{Result, UnflattenError, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{
    BlockEvent, BlockFailure, ConfigSnapshot, ExtractionOutcome, ExtractionProgress,
    ExtractionReport, FileOperations, OutputManager, PlannedFile, WrittenFile,
};
pub use parser::{normalize_relative_path, render_document, BlockParser, FileBlock};
pub use ui::{OutputFormatter, OutputMode, ProgressManager};

use std::io::ErrorKind;
use std::path::Path;

/// Main library interface: recreates a directory tree from a combined file.
pub struct Unflattener {
    config: Config,
    parser: BlockParser,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
}

impl Unflattener {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        Ok(Self {
            config,
            parser: BlockParser::new()?,
            output_formatter,
            progress_manager,
        })
    }

    /// No terminal output of any kind, failures included. Results are only
    /// available through the returned report.
    pub fn silent(config: Config) -> Result<Self> {
        Ok(Self {
            config,
            parser: BlockParser::new()?,
            output_formatter: OutputFormatter::silent(),
            progress_manager: ProgressManager::new(false),
        })
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbose, cli_args.quiet)
    }

    /// Runs one extraction: check output, create it, read input, write blocks.
    ///
    /// `OutputAlreadyExists` is returned before anything is touched. Input
    /// errors are returned after the output directory was created; it is
    /// left in place. Per-block failures do not abort the run and are
    /// listed in the report.
    pub fn extract(&self, input_path: &Path, output_dir: &Path) -> Result<ExtractionReport> {
        self.output_formatter
            .start_operation("Recreating project from combined file");

        let output_manager = OutputManager::new(output_dir);
        output_manager.check_available()?;

        self.output_formatter.info(&format!(
            "Creating project in new directory: '{}'",
            output_dir.display()
        ));
        output_manager.initialize()?;

        let document = self.read_document(input_path)?;
        log::debug!(
            "read {} bytes from {}",
            document.len(),
            input_path.display()
        );

        let block_progress = self.progress_manager.create_block_progress();
        let event_callback = |event: &BlockEvent| {
            self.progress_manager
                .suspend(|| self.output_formatter.print_block_event(event));
            ui::progress::update_block_progress(&block_progress, event);
        };

        let progress = self.file_operations().extract_blocks(
            self.parser.blocks(&document),
            output_manager.get_output_directory(),
            Some(&event_callback),
        );

        ui::progress::finish_progress_with_summary(
            &block_progress,
            &format!("Processed {} blocks", progress.blocks_matched),
            progress.elapsed(),
        );
        self.progress_manager.clear();

        self.output_formatter.print_extraction_summary(&progress);

        Ok(output_manager.create_extraction_report(
            input_path,
            &progress,
            &self.create_config_snapshot(),
        ))
    }

    /// Dry run: validates the output path and lists destinations. Writes nothing.
    pub fn plan(&self, input_path: &Path, output_dir: &Path) -> Result<Vec<PlannedFile>> {
        self.output_formatter
            .info("DRY RUN MODE - No files will be written");

        OutputManager::new(output_dir).check_available()?;
        let document = self.read_document(input_path)?;

        let plan = self
            .file_operations()
            .plan_blocks(self.parser.blocks(&document), output_dir);

        self.output_formatter.print_plan(&plan);
        if plan.is_empty() {
            self.output_formatter
                .info("No files were found in the input file to recreate.");
        } else {
            self.output_formatter
                .info(&format!("Would recreate {} files.", plan.len()));
        }

        Ok(plan)
    }

    fn read_document(&self, input_path: &Path) -> Result<String> {
        let content = std::fs::read_to_string(input_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => UnflattenError::InputNotFound {
                path: input_path.display().to_string(),
            },
            ErrorKind::InvalidData => UnflattenError::InputNotUtf8 {
                path: input_path.display().to_string(),
            },
            _ => UnflattenError::Io(e),
        })?;

        if self.config.parse.normalize_newlines {
            Ok(parser::normalize_newlines(content))
        } else {
            Ok(content)
        }
    }

    fn file_operations(&self) -> FileOperations {
        FileOperations::new()
            .with_strict_paths(self.config.output.strict_paths)
            .with_duplicate_policy(self.config.output.on_duplicate)
    }

    fn create_config_snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::from(&self.config)
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &UnflattenError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Extracts `input_path` into the new directory `output_dir` with default
/// settings and no terminal output.
pub fn extract<P, Q>(input_path: P, output_dir: Q) -> Result<ExtractionOutcome>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let unflattener = Unflattener::silent(Config::default())?;
    let report = unflattener.extract(input_path.as_ref(), output_dir.as_ref())?;
    Ok(report.outcome)
}
