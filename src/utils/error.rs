use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenamerError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("status code error: {status}")]
    StatusError { status: String },

    #[error("{message}")]
    ScrapeError { message: String },

    #[error("failed to fetch or parse album data: {0}")]
    AlbumFetchError(#[source] Box<RenamerError>),

    #[error("AI API error: {status} - {body}")]
    AiApiError { status: String, body: String },

    #[error("{message}")]
    AiResponseError { message: String },
}

pub type Result<T> = std::result::Result<T, RenamerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Io,
    Data,
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RenamerError {
    pub fn scrape(message: impl Into<String>) -> Self {
        Self::ScrapeError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AlbumFetchError(inner) => inner.category(),
            Self::HttpError(_) | Self::StatusError { .. } | Self::AiApiError { .. } => {
                ErrorCategory::Network
            }
            Self::IoError(_) => ErrorCategory::Io,
            Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::ScrapeError { .. }
            | Self::AiResponseError { .. } => ErrorCategory::Data,
            Self::TomlParseError(_)
            | Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Config,
        }
    }

    /// 嚴重程度決定 CLI 的退出碼
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Config => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::AlbumFetchError(inner) => inner.recovery_suggestion(),
            Self::HttpError(_) | Self::StatusError { .. } => {
                "Check the network connection and that the release URL opens in a browser"
            }
            Self::ScrapeError { .. } => {
                "Make sure the URL points to a Bandcamp album/track or a Beatport release page"
            }
            Self::AiApiError { .. } => "Check the Gemini API key and quota, then retry",
            Self::AiResponseError { .. } => "Retry the request; the model reply was not valid JSON",
            Self::IoError(_) => "Check that the folder exists and is writable",
            Self::CsvError(_) | Self::SerializationError(_) => {
                "Make sure the plan file was produced by track-renamer and is not truncated"
            }
            Self::TomlParseError(_) => "Fix the syntax of the TOML configuration file",
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Review the command line flags and configuration file"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the remote service: {}", self),
            ErrorCategory::Io => format!("File system error: {}", self),
            ErrorCategory::Data => format!("Could not understand the data: {}", self),
            ErrorCategory::Config => format!("Invalid configuration: {}", self),
        }
    }
}
