use thiserror::Error;

#[derive(Error, Debug)]
pub enum WrapError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Model construction failed: {message}")]
    ConstructionError { message: String },

    #[error("Attempt to mutate immutable model at '{key_path}'")]
    ImmutableModel { key_path: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl WrapError {
    pub fn construction(message: impl Into<String>) -> Self {
        WrapError::ConstructionError {
            message: message.into(),
        }
    }

    /// Whether the error came from configuration rather than model data.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            WrapError::ConfigError { .. }
                | WrapError::ConfigValidationError { .. }
                | WrapError::InvalidConfigValueError { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, WrapError>;
