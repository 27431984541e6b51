//! docver CLI - Main entry point

use clap::Parser;
use docver_cli::{Cli, Commands};
use docver_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

fn main() {
    let cli = Cli::parse();

    // Verbose mode logs debug to the console; otherwise warnings only
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("docver-cli")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _guard = init_logging(&log_config).ok();

    if let Err(e) = execute_command(&cli) {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn execute_command(cli: &Cli) -> docver_cli::Result<()> {
    match &cli.command {
        Commands::Validate { file } => docver_cli::commands::validate::run(file),
        Commands::Options {
            config,
            doc_type,
            state,
            json,
        } => docver_cli::commands::options::run(config, doc_type, state.as_deref(), *json),
        Commands::Label {
            major,
            minor,
            checked_out,
        } => docver_cli::commands::label::run(*major, *minor, *checked_out),
    }
}
