use crate::core::decoder::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Card parse error: {0}")]
    ParseError(#[from] ParseError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Browser error: {message}")]
    BrowserError { message: String },

    #[error("Login failed: {message}")]
    LoginError { message: String },

    #[error("Navigation failed: {message}")]
    NavigationError { message: String },

    #[error("Sink error: {message}")]
    SinkError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[cfg(feature = "browser")]
impl From<chromiumoxide::error::CdpError> for ScrapeError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        ScrapeError::BrowserError {
            message: err.to_string(),
        }
    }
}

impl ScrapeError {
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ScrapeError::ParseError(_) => "The card token was skipped; check the page layout if this repeats",
            ScrapeError::CsvError(_) | ScrapeError::SinkError { .. } => {
                "Check that CSV_PATH points to a writable file"
            }
            ScrapeError::IoError(_) => "Check file permissions and free disk space",
            ScrapeError::SerializationError(_) => "The page returned an unexpected script result",
            ScrapeError::BrowserError { .. } => {
                "Make sure Chromium is installed (or set CHROME_PATH) and a display is available"
            }
            ScrapeError::LoginError { .. } => "Verify NOH_USER / NOH_PASS and that the site is reachable",
            ScrapeError::NavigationError { .. } => {
                "The site layout may have changed; inspect the snapshots in the debug directory"
            }
            ScrapeError::ConfigError { .. }
            | ScrapeError::MissingConfigError { .. }
            | ScrapeError::InvalidConfigValueError { .. } => {
                "Fix the environment variables or the TOML config file"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ScrapeError::MissingConfigError { field } => {
                format!("Missing {} (set it in the environment or the config file)", field)
            }
            ScrapeError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid {}: {}", field, reason)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
