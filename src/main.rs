// src/main.rs

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notion2markdown::{
    run_dedup, run_full_export, run_retry, AppError, Command, CommandLineInput, DedupConfig,
    ExportConfig, ExportSummary, NotionHttpClient,
};
use std::fs;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_file_path = std::env::temp_dir().join("notion2markdown.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)
        .with_context(|| format!("Failed to open log file {}", log_file_path.display()))?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::debug!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Prints the end-of-run report for an export or retry.
fn report_export(summary: &ExportSummary) {
    println!("✓ Exported {}", summary.stats);
    if let Some(path) = &summary.error_log {
        eprintln!(
            "⚠️  {} errors were logged to {}. Run `retry` to export them again.",
            summary.stats.errors,
            path.display()
        );
    }
}

async fn execute(command: Command) -> Result<(), AppError> {
    match command {
        Command::Export(args) => {
            let config = ExportConfig::resolve(args)?;
            let client = NotionHttpClient::new(&config.api_key)?;
            let summary = run_full_export(&client, &config).await?;
            report_export(&summary);
        }
        Command::Retry(args) => {
            let config = ExportConfig::resolve(args)?;
            let client = NotionHttpClient::new(&config.api_key)?;
            let summary = run_retry(&client, &config).await?;
            report_export(&summary);
        }
        Command::Dedup(args) => {
            let config = DedupConfig::resolve(args)?;
            let report = run_dedup(&config)?;
            if config.confirmed {
                println!(
                    "✓ Removed {} duplicate attachments",
                    report.trashed + report.deleted
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose).context("Failed to initialize logging")?;

    execute(cli.command).await?;

    Ok(())
}
