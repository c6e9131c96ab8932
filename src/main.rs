// ABOUTME: Entry point for the imagedash CLI application.
// ABOUTME: Parses arguments and dispatches to the API server or one-shot image commands.

mod cli;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use imagedash::api;
use imagedash::config::{self, Config};
use imagedash::error::{Error, Result};
use imagedash::images::{ImageError, ImageService, JSON_LINE_FORMAT};
use imagedash::runtime::{Executor, RuntimeCommand, RuntimeError};
use nonempty::NonEmpty;
use output::{Output, OutputMode};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // --verbose wins; otherwise RUST_LOG, then a per-command default
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        let default = match cli.command {
            Commands::Serve { .. } => "info",
            _ => "warn",
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut output = Output::new(OutputMode::from_flags(cli.quiet, cli.json));

    if let Err(e) = run(cli, &mut output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

fn current_dir() -> Result<PathBuf> {
    Ok(env::current_dir()?)
}

async fn run(cli: Cli, output: &mut Output) -> Result<()> {
    let load_config =
        || -> Result<Config> { Config::resolve(&current_dir()?, cli.config.as_deref()) };

    match cli.command {
        Commands::Init { runtime, force } => {
            config::init_config(&current_dir()?, runtime.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Serve { bind } => {
            let mut config = load_config()?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            api::serve(&config).await
        }
        Commands::Runtime => show_runtime(&load_config()?, output),
        Commands::Images => {
            let service = image_service(&load_config()?);
            let listing = service.list_images().await?;
            output.images(&listing.images);
            if listing.malformed > 0 {
                output.progress(&format!(
                    "{} line(s) of runtime output could not be parsed",
                    listing.malformed
                ));
            }
            Ok(())
        }
        Commands::Rmi { images } => {
            let service = image_service(&load_config()?);
            let outcomes = service.delete_images(&images).await;
            let failed = outcomes.iter().filter(|o| !o.success).count();
            for outcome in &outcomes {
                match (&outcome.message, &outcome.error) {
                    (Some(message), _) => output.value(outcome, message),
                    (None, Some(error)) => {
                        output.failure(&format!("{}: {error}", outcome.image_name))
                    }
                    (None, None) => {}
                }
            }
            if failed > 0 {
                return Err(Error::PartialFailure {
                    failed,
                    total: outcomes.len(),
                });
            }
            Ok(())
        }
        Commands::Save {
            output: path,
            images,
        } => {
            let config = load_config()?;
            let names = NonEmpty::from_vec(images).ok_or(ImageError::EmptyNameList)?;
            output.start_timer();
            output.progress(&format!("Saving {} image(s) to {}", names.len(), path.display()));

            let archive = image_service(&config).save_image(&names, &path).await?;
            output.success(&format!(
                "Saved {} ({} bytes)",
                archive.path.display(),
                archive.size
            ));
            Ok(())
        }
        Commands::Load { input } => {
            let report = image_service(&load_config()?).load_image(&input).await?;
            let summary = if report.loaded_images.is_empty() {
                report.output.trim().to_string()
            } else {
                report
                    .loaded_images
                    .iter()
                    .map(|name| format!("Loaded image: {name}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            output.value(&report, &summary);
            Ok(())
        }
    }
}

fn image_service(config: &Config) -> ImageService {
    ImageService::new(Executor::system(config.runtime_config(), config.retry))
}

fn show_runtime(config: &Config, output: &Output) -> Result<()> {
    let executor = Executor::system(config.runtime_config(), config.retry);
    let runtime = executor.detect().map_err(RuntimeError::from)?;
    let example = runtime.compose(&RuntimeCommand::new("images").args(["--format", JSON_LINE_FORMAT]));
    output.value(
        &serde_json::json!({
            "runtime": runtime,
            "binary": runtime.binary(),
            "pinned": config.runtime.is_some(),
            "listCommand": example.shell_line(),
        }),
        &format!("{runtime} (list command: {})", example.shell_line()),
    );
    Ok(())
}
