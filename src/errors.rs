use thiserror::Error;

/// Main error type for the tailwind-config crate
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Glob error: {0}")]
    Glob(#[from] glob::GlobError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("No configuration file found in {0}")]
    NotFound(String),

    #[error("Failed to parse config {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Unsupported config file format: {0}. Use .js, .cjs, .mjs, .json, .yaml or .yml")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to write output to {path}: {message}")]
    OutputError { path: String, message: String },

    #[error("Security violation: {0}")]
    SecurityError(String),
}

impl ConfigError {
    pub(crate) fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
