use crate::config::{CliOverrides, Config, DuplicatePolicy};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "unflatten")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Recreate a project structure from a combined text file")]
#[command(
    long_about = "Unflatten reads a text file that concatenates many source files as \
                  '--- START OF FILE: <path> ---' ... '--- END OF FILE: <path> ---' blocks \
                  and writes each block back to disk under a new output directory."
)]
#[command(after_help = "EXAMPLES:\n  \
    unflatten combined_project_code.txt my_project\n  \
    unflatten dump.txt restored --strict-paths --on-duplicate error\n  \
    unflatten dump.txt restored --output-format json --report restored.json\n  \
    unflatten dump.txt restored --dry-run")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Path to the combined project text file
    #[arg(required_unless_present = "generate_config")]
    pub input_file: Option<PathBuf>,

    /// New directory to recreate the project in (must not exist)
    #[arg(required_unless_present = "generate_config")]
    pub output_directory: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for progress and results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Reject block paths that resolve outside the output directory
    #[arg(long)]
    pub strict_paths: bool,

    /// What to do when two blocks resolve to the same file
    #[arg(long, value_enum)]
    pub on_duplicate: Option<DuplicateArg>,

    /// Keep carriage returns instead of converting line endings to \n
    #[arg(long)]
    pub keep_line_endings: bool,

    /// Write a JSON extraction report to this path
    #[arg(long, conflicts_with = "dry_run")]
    pub report: Option<PathBuf>,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only errors are printed)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (show what would be written without writing anything)
    #[arg(long, help = "Show what would be extracted without actually doing it")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DuplicateArg {
    /// Last block wins
    Overwrite,
    /// Later blocks for the same file are reported as failures
    Error,
}

impl From<DuplicateArg> for DuplicatePolicy {
    fn from(arg: DuplicateArg) -> Self {
        match arg {
            DuplicateArg::Overwrite => DuplicatePolicy::Overwrite,
            DuplicateArg::Error => DuplicatePolicy::Error,
        }
    }
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;
        config.merge_with_cli_args(&self.create_cli_overrides());
        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_strict_paths(self.strict_paths.then_some(true))
            .with_on_duplicate(self.on_duplicate.map(DuplicatePolicy::from))
            .with_normalize_newlines(self.keep_line_endings.then_some(false))
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}
