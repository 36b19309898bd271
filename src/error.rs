//! Error taxonomy for monorelease operations.

use thiserror::Error;

/// Main error type for monorelease operations.
#[derive(Error, Debug)]
pub enum MonoreleaseError {
    // Cli args errors
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    // Configuration errors: always fatal and raised before any side effect
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Forge errors
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Release already exists for tag: {0}")]
    DuplicateRelease(String),

    #[error("Transient forge error: {0}")]
    TransientApi(String),

    #[error("API authentication failed: {0}")]
    AuthenticationError(String),

    #[error("API rate limit exceeded")]
    RateLimitExceeded,

    #[error("Forge operation failed: {0}")]
    ForgeError(String),

    #[error("Invalid git remote URL: {0}")]
    InvalidRemoteUrl(String),

    // Version/parsing errors - automatic conversions via #[from]
    #[error("Invalid version format: {0}")]
    InvalidVersion(#[from] semver::Error),

    #[error("Template rendering failed: {0}")]
    TemplateError(#[from] tera::Error),

    #[error("TOML edit error: {0}")]
    TomlEditError(#[from] toml_edit::TomlError),

    #[error("JSON parse error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("Regular expression error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] log::SetLoggerError),

    // Generic wrapper for other errors
    #[error(transparent)]
    Other(#[from] color_eyre::Report),
}

/// Result type alias using MonoreleaseError
pub type Result<T> = std::result::Result<T, MonoreleaseError>;

impl MonoreleaseError {
    /// Create a forge error with context
    pub fn forge(msg: impl Into<String>) -> Self {
        Self::ForgeError(msg.into())
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Server side failures that are safe to retry at the forge layer
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientApi(_))
    }
}

impl From<std::io::Error> for MonoreleaseError {
    fn from(err: std::io::Error) -> Self {
        Self::Other(color_eyre::Report::from(err))
    }
}

impl From<octocrab::Error> for MonoreleaseError {
    fn from(err: octocrab::Error) -> Self {
        match &err {
            octocrab::Error::GitHub { source, .. } => {
                let status = source.status_code.as_u16();
                let errors = format!("{:?}", source.errors);

                if source.message.contains("rate limit") {
                    Self::RateLimitExceeded
                } else if status == 401 || status == 403 {
                    Self::AuthenticationError(source.message.clone())
                } else if status == 404 {
                    Self::NotFound(source.message.clone())
                } else if status == 422 && errors.contains("already_exists") {
                    Self::DuplicateRelease(source.message.clone())
                } else if status >= 500 {
                    Self::TransientApi(format!(
                        "status {status}: {}",
                        source.message
                    ))
                } else {
                    Self::ForgeError(format!("GitHub API error: {}", err))
                }
            }
            _ => Self::ForgeError(format!("GitHub API error: {}", err)),
        }
    }
}
