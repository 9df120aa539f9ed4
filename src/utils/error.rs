use thiserror::Error;

#[derive(Error, Debug)]
pub enum NuldcError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned HTTP {status} for {url}")]
    HttpStatusError { url: String, status: u16 },

    #[error("Could not decode response from {url}: {source}")]
    DecodeError {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("XML serialization error: {message}")]
    XmlError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error(
        "Query matched {total} records, but the API cannot return more than {limit} records per request"
    )]
    CeilingExceeded { total: u64, limit: u64 },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl NuldcError {
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::DecodeError {
            url: url.into(),
            source,
        }
    }

    /// Network-level failures: the request never produced a usable response.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::ApiError(_) | Self::HttpStatusError { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::DecodeError { .. } | Self::SerializationError(_))
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ApiError(_) | Self::HttpStatusError { .. } => ErrorSeverity::Medium,
            Self::DecodeError { .. }
            | Self::SerializationError(_)
            | Self::CsvError(_)
            | Self::XmlError { .. }
            | Self::ProcessingError { .. }
            | Self::CeilingExceeded { .. } => ErrorSeverity::High,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => ErrorSeverity::High,
            Self::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::ApiError(_) | Self::HttpStatusError { .. } => {
                "Check the API base URL and your network connection, then retry".to_string()
            }
            Self::DecodeError { .. } | Self::SerializationError(_) => {
                "The API answered with something other than the expected JSON; check the endpoint and the `as` format".to_string()
            }
            Self::CeilingExceeded { limit, .. } => format!(
                "Narrow the query so it matches at most {} records, e.g. scope it to a single collection with `collection.id:<id>`",
                limit
            ),
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command-line flags".to_string()
            }
            Self::CsvError(_) | Self::XmlError { .. } | Self::IoError(_) => {
                "Check that the output path is writable".to_string()
            }
            Self::ProcessingError { .. } => "Re-run with --verbose for details".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::CeilingExceeded { total, limit } => format!(
                "Your query matched {} records. The API cannot return more than {} records per request.",
                total, limit
            ),
            Self::HttpStatusError { status, .. } => format!("The API answered with HTTP {}", status),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NuldcError>;
