// src/config.rs
use crate::constants::{DEDUP_MIN_FILE_SIZE, DEFAULT_ERROR_LOG_FILE};
use crate::error::AppError;
use crate::types::{ApiKey, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Export every page and database shared with the integration
    Export(ExportArgs),
    /// Re-export only the pages named in a previous run's error log
    Retry(ExportArgs),
    /// Merge duplicate attachments in an existing export
    Dedup(DedupArgs),
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Root directory of the export
    pub output_dir: PathBuf,

    /// Page edit times at or after this instant are treated as corrupted and
    /// recovered from block timestamps (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub edit_time_cutoff: Option<String>,

    /// Error log location (defaults to <OUTPUT_DIR>/export-errors.log)
    #[arg(long)]
    pub error_log: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DedupArgs {
    /// Root directory of the export
    pub output_dir: PathBuf,

    /// Ignore attachments smaller than this many bytes
    #[arg(long, default_value_t = DEDUP_MIN_FILE_SIZE)]
    pub min_size: u64,

    /// Apply the changes instead of only listing them
    #[arg(short, long, default_value_t = false)]
    pub yes: bool,
}

/// Resolved configuration for an export or retry run.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub api_key: ApiKey,
    pub output_dir: PathBuf,
    pub error_log: PathBuf,
    pub edit_time_cutoff: Option<DateTime<Utc>>,
}

impl ExportConfig {
    /// Resolves an export configuration from CLI input and environment.
    pub fn resolve(args: ExportArgs) -> Result<Self, AppError> {
        let api_key_str = std::env::var("NOTION_API_KEY").map_err(|_| {
            AppError::MissingConfiguration(
                "NOTION_API_KEY environment variable not set".to_string(),
            )
        })?;
        let api_key = ApiKey::new(api_key_str)?;
        Self::from_args(api_key, args)
    }

    /// Resolves everything except the API key.
    pub fn from_args(api_key: ApiKey, args: ExportArgs) -> Result<Self, AppError> {
        let edit_time_cutoff = args
            .edit_time_cutoff
            .as_deref()
            .map(parse_cutoff)
            .transpose()?;
        let error_log = args
            .error_log
            .unwrap_or_else(|| args.output_dir.join(DEFAULT_ERROR_LOG_FILE));

        Ok(Self {
            api_key,
            output_dir: args.output_dir,
            error_log,
            edit_time_cutoff,
        })
    }
}

/// Resolved configuration for a deduplication pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupConfig {
    pub output_dir: PathBuf,
    pub min_size: u64,
    pub confirmed: bool,
}

impl DedupConfig {
    pub fn resolve(args: DedupArgs) -> Result<Self, AppError> {
        if args.min_size == 0 {
            return Err(ValidationError::TooSmall {
                value: args.min_size,
                min: 1,
            }
            .into());
        }
        Ok(Self {
            output_dir: args.output_dir,
            min_size: args.min_size,
            confirmed: args.yes,
        })
    }
}

/// Accepts a full RFC 3339 timestamp or a date, read as midnight UTC.
pub fn parse_cutoff(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| ValidationError::InvalidTimestamp {
            value: value.to_string(),
            reason: "expected RFC 3339 (2024-05-01T00:00:00Z) or YYYY-MM-DD".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn api_key() -> ApiKey {
        ApiKey::new("secret_abcdefghijklmnopqrstuvwxyz0123456789ABC").unwrap()
    }

    #[test]
    fn test_cutoff_accepts_timestamps_and_dates() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_cutoff("2024-05-01").unwrap(), expected);
        assert_eq!(parse_cutoff("2024-05-01T02:00:00+02:00").unwrap(), expected);
        assert!(parse_cutoff("last tuesday").is_err());
    }

    #[test]
    fn test_error_log_defaults_into_output_dir() {
        let args = ExportArgs {
            output_dir: PathBuf::from("/tmp/export"),
            edit_time_cutoff: None,
            error_log: None,
        };
        let config = ExportConfig::from_args(api_key(), args).unwrap();
        assert_eq!(
            config.error_log,
            PathBuf::from("/tmp/export/export-errors.log")
        );
        assert_eq!(config.edit_time_cutoff, None);
    }

    #[test]
    fn test_subcommands_parse() {
        let cli = CommandLineInput::try_parse_from([
            "notion2markdown",
            "dedup",
            "out",
            "--min-size",
            "4096",
            "--yes",
        ])
        .unwrap();
        match cli.command {
            Command::Dedup(args) => {
                let config = DedupConfig::resolve(args).unwrap();
                assert_eq!(config.min_size, 4096);
                assert!(config.confirmed);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_zero_min_size_is_rejected() {
        let args = DedupArgs {
            output_dir: PathBuf::from("out"),
            min_size: 0,
            yes: false,
        };
        assert!(DedupConfig::resolve(args).is_err());
    }
}
