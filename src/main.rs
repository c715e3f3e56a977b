use clap::Parser;
use std::process;
use unflatten::{
    Cli, OutputFormatter, OutputMode, UnflattenError, Unflattener,
    UserFriendlyError,
};

fn main() {
    let cli = Cli::parse();
    setup_logging(&cli);

    let exit_code = run(&cli);
    process::exit(exit_code);
}

fn run(cli: &Cli) -> i32 {
    if cli.generate_config {
        return handle_generate_config(cli);
    }

    let (Some(input_file), Some(output_directory)) = (&cli.input_file, &cli.output_directory)
    else {
        // clap enforces both positionals unless --generate-config is set
        return 1;
    };

    let unflattener = match Unflattener::from_cli(cli) {
        Ok(unflattener) => unflattener,
        Err(e) => {
            print_startup_error(&e);
            return 1;
        }
    };

    if cli.dry_run {
        return match unflattener.plan(input_file, output_directory) {
            Ok(_) => 0,
            Err(e) => {
                unflattener.handle_error(&e);
                exit_code_for(&e)
            }
        };
    }

    match unflattener.extract(input_file, output_directory) {
        Ok(report) => {
            unflattener.output_formatter().print_extraction_report(&report);

            if let Some(ref report_path) = cli.report {
                if let Err(e) = report.save_to_file(report_path) {
                    unflattener.handle_error(&e);
                    return 1;
                }
            }

            if report.has_failures() {
                2 // Completed, but some blocks could not be written
            } else {
                0
            }
        }
        Err(e) => {
            unflattener.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &UnflattenError) -> i32 {
    match error {
        UnflattenError::InputNotFound { .. } => 3,
        UnflattenError::OutputAlreadyExists { .. } => 4,
        UnflattenError::InputNotUtf8 { .. } => 5,
        _ => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "unflatten.toml".to_string());

    match Unflattener::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  unflatten <input-file> <output-directory> --config {}", config_path);
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn print_startup_error(error: &UnflattenError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

fn default_log_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "unflatten=warn",
        1 => "unflatten=info",
        2 => "unflatten=debug",
        _ => "unflatten=trace",
    }
}

fn setup_logging(cli: &Cli) {
    let default_filter = default_log_filter(cli.verbosity_level());

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}
