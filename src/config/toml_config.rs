use crate::adapters::http::RetryPolicy;
use crate::app::dump::DumpSettings;
use crate::core::client::{ClientSettings, DEFAULT_BASE_URL};
use crate::core::walk::{WalkOptions, DEFAULT_MAX_RECORDS};
use crate::utils::error::{NuldcError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Settings file for both binaries. Every key is optional.
///
/// ```toml
/// [api]
/// base_url = "${NULDC_API_URL}"
/// max_records = 100000
///
/// [dump]
/// workers = 4
/// output_path = "./dump"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub api: ApiSection,
    pub dump: DumpSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: String,
    pub page_size: u32,
    /// Largest `total_hits` a paged request may declare.
    pub max_records: u64,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub progress: bool,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 200,
            max_records: DEFAULT_MAX_RECORDS,
            timeout_seconds: 30,
            retry_attempts: 3,
            retry_base_delay_ms: 500,
            progress: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpSection {
    pub workers: usize,
    pub page_size: u32,
    pub output_path: String,
    /// Holds the date of the last complete run, relative to `output_path`.
    pub marker_file: String,
    pub aggregation_size: u32,
}

impl Default for DumpSection {
    fn default() -> Self {
        Self {
            workers: 10,
            page_size: 250,
            output_path: ".".to_string(),
            marker_file: "_updated_at.txt".to_string(),
            aggregation_size: 1000,
        }
    }
}

impl ApiConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(NuldcError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| NuldcError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::debug!("⚙️ Loading configuration from {}", path.display());
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| NuldcError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            max_records: self.api.max_records,
            show_progress: self.api.progress,
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api.base_url.clone(),
            page_size: self.api.page_size,
            walk: self.walk_options(),
        }
    }

    /// Client settings for the dump: its own page size, and no per-walk
    /// progress bars since walks run side by side.
    pub fn dump_client_settings(&self) -> ClientSettings {
        ClientSettings {
            page_size: self.dump.page_size,
            walk: WalkOptions {
                show_progress: false,
                ..self.walk_options()
            },
            ..self.client_settings()
        }
    }

    pub fn dump_settings(&self) -> DumpSettings {
        DumpSettings {
            workers: self.dump.workers,
            marker_file: self.dump.marker_file.clone(),
            aggregation_size: self.dump.aggregation_size,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.api.retry_attempts,
            Duration::from_millis(self.api.retry_base_delay_ms),
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }
}

impl Validate for ApiConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api.base_url", &self.api.base_url)?;
        validate_range("api.page_size", self.api.page_size, 1, 10_000)?;
        validate_positive_number("api.max_records", self.api.max_records, 1)?;
        validate_positive_number("api.timeout_seconds", self.api.timeout_seconds, 1)?;
        validate_positive_number("api.retry_attempts", u64::from(self.api.retry_attempts), 1)?;

        validate_range("dump.workers", self.dump.workers, 1, 64)?;
        validate_range("dump.page_size", self.dump.page_size, 1, 10_000)?;
        validate_path("dump.output_path", &self.dump.output_path)?;
        validate_non_empty_string("dump.marker_file", &self.dump.marker_file)?;
        validate_positive_number("dump.aggregation_size", u64::from(self.dump.aggregation_size), 1)?;
        Ok(())
    }
}
