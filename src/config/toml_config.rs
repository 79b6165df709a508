use crate::domain::model::UnresolvedPolicy;
use crate::utils::error::{EtlError, FileOperation, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Optional TOML file holding defaults that the command line can override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub source: SourceConfig,
    pub transform: TransformConfig,
    pub output: OutputConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub database_url: Option<String>,
    pub user_agent: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    pub unresolved_reference: Option<UnresolvedPolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub summary_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl FileConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| EtlError::FileAccessError {
                operation: FileOperation::Read,
                path: path.display().to_string(),
                source,
            })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for FileConfig {
    fn validate(&self) -> Result<()> {
        if let Some(url) = &self.source.database_url {
            validation::validate_url("source.database_url", url)?;
        }
        if let Some(user_agent) = &self.source.user_agent {
            validation::validate_non_empty_string("source.user_agent", user_agent)?;
        }
        if let Some(timeout) = self.source.timeout_seconds {
            validation::validate_positive_number("source.timeout_seconds", timeout, 1)?;
        }
        if let Some(delimiter) = &self.source.delimiter {
            validation::parse_delimiter("source.delimiter", delimiter)?;
        }
        if let Some(path) = &self.output.summary_path {
            validation::validate_path("output.summary_path", &path.to_string_lossy())?;
        }
        Ok(())
    }
}
