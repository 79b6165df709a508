pub mod cli;
pub mod toml_config;

use crate::core::acquire::DEFAULT_USER_AGENT;
use crate::core::ConfigProvider;
use crate::domain::model::{SourceMode, UnresolvedPolicy};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(feature = "cli")]
use crate::core::acquire::DEFAULT_DATABASE_URL;
#[cfg(feature = "cli")]
use crate::utils::error::EtlError;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use toml_config::FileConfig;

/// Converts FAA registration data to the simplified EmComm Tools format.
///
/// Downloads the FAA registry archive by default. A different archive URL can
/// be given with --database-url, or the two files can be passed directly:
///
///   faa2etc --registration-file MASTER.txt --reference-file ACFTREF.txt faa.txt
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "faa2etc", version)]
pub struct CliConfig {
    /// Output file, e.g. faa.txt
    pub output: PathBuf,

    /// The URL to download the FAA database from
    #[arg(long, conflicts_with_all = ["registration_file", "reference_file"])]
    pub database_url: Option<String>,

    /// Registration file, e.g. MASTER.txt
    #[arg(long, requires = "reference_file")]
    pub registration_file: Option<PathBuf>,

    /// Aircraft reference file, e.g. ACFTREF.txt
    #[arg(long, requires = "registration_file")]
    pub reference_file: Option<PathBuf>,

    /// What to do with registrations whose aircraft code is not in the reference file
    #[arg(long, value_enum)]
    pub unresolved: Option<UnresolvedPolicy>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write a JSON run summary to this path
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Log CPU and memory usage after each stage
    #[arg(long)]
    pub monitor: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Merges the command line over the optional file config and built-in defaults.
    pub fn into_run_config(self, file: Option<FileConfig>) -> Result<RunConfig> {
        let file = file.unwrap_or_default();

        let source = match (self.registration_file, self.reference_file) {
            (Some(registration), Some(reference)) => SourceMode::Local {
                registration,
                reference,
            },
            (None, None) => SourceMode::Download {
                url: self
                    .database_url
                    .or(file.source.database_url)
                    .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            },
            _ => {
                return Err(EtlError::ConfigError {
                    message: "--registration-file and --reference-file must be given together"
                        .to_string(),
                })
            }
        };

        let input_delimiter = match &file.source.delimiter {
            Some(delimiter) => validation::parse_delimiter("source.delimiter", delimiter)?,
            None => b',',
        };

        let config = RunConfig {
            source,
            output_path: self.output,
            unresolved_policy: self
                .unresolved
                .or(file.transform.unresolved_reference)
                .unwrap_or_default(),
            user_agent: file
                .source
                .user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            request_timeout: file.source.timeout_seconds.map(Duration::from_secs),
            input_delimiter,
            summary_path: self.summary.or(file.output.summary_path),
            monitor: self.monitor || file.monitoring.enabled,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source: SourceMode,
    pub output_path: PathBuf,
    pub unresolved_policy: UnresolvedPolicy,
    pub user_agent: String,
    pub request_timeout: Option<Duration>,
    pub input_delimiter: u8,
    pub summary_path: Option<PathBuf>,
    pub monitor: bool,
}

impl RunConfig {
    pub fn new(source: SourceMode, output_path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            output_path: output_path.into(),
            unresolved_policy: UnresolvedPolicy::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: None,
            input_delimiter: b',',
            summary_path: None,
            monitor: false,
        }
    }

    pub fn with_unresolved_policy(mut self, policy: UnresolvedPolicy) -> Self {
        self.unresolved_policy = policy;
        self
    }
}

impl ConfigProvider for RunConfig {
    fn source_mode(&self) -> &SourceMode {
        &self.source
    }

    fn output_path(&self) -> &Path {
        &self.output_path
    }

    fn unresolved_policy(&self) -> UnresolvedPolicy {
        self.unresolved_policy
    }

    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    fn input_delimiter(&self) -> u8 {
        self.input_delimiter
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        match &self.source {
            SourceMode::Download { url } => validation::validate_url("database_url", url)?,
            SourceMode::Local {
                registration,
                reference,
            } => {
                validation::validate_path("registration_file", &registration.to_string_lossy())?;
                validation::validate_path("reference_file", &reference.to_string_lossy())?;
            }
        }

        validation::validate_path("output", &self.output_path.to_string_lossy())?;
        validation::validate_non_empty_string("user_agent", &self.user_agent)?;

        if let Some(path) = &self.summary_path {
            validation::validate_path("summary", &path.to_string_lossy())?;
        }
        Ok(())
    }
}
