use clap::Parser;
use std::process::ExitCode;
use tracing::debug;

mod cli;
mod commands;
mod config;
mod domain;
mod error;
mod infrastructure;
mod services;
mod tools;
mod ui;

use cli::{ApptainerCommands, Cli, Commands};
use error::SandboxError;

/// Initialize logging with SANDBOX_LOG / LOG_LEVEL env var support
///
/// SANDBOX_LOG=debug or a full filter such as SANDBOX_LOG=sandbox=debug,aws_config=warn
fn init_logging(verbose: bool) {
    let log_level = std::env::var("SANDBOX_LOG")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false)
        .init();
}

/// Render an error as an abort box and log the full chain
fn report(err: &anyhow::Error) {
    let subject = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<SandboxError>())
        .map(SandboxError::subject)
        .unwrap_or("Unexpected error");

    debug!("{}: {:?}", subject, err);

    let details: Vec<String> = err.chain().map(|cause| cause.to_string()).collect();
    ui::print_abort(subject, &details);
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::SetConfig {
            aws_access_key_id,
            aws_secret_access_key,
            aws_ecr_public_registry,
        } => commands::config::set(
            aws_access_key_id,
            aws_secret_access_key,
            aws_ecr_public_registry,
        ),
        Commands::ShowConfig => commands::config::show(),
        Commands::ClearConfig => commands::config::clear(),
        Commands::Apptainer(ApptainerCommands::Build {
            image_name,
            image_source,
            output_dir,
        }) => commands::apptainer::build(image_name, image_source, output_dir).await,
        Commands::Apptainer(ApptainerCommands::Publish {
            image_path,
            image_tag,
        }) => commands::apptainer::publish(image_path, image_tag).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}
