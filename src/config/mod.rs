use crate::domain::tri_state::{install_truthy_tokens, TruthyTokens, DEFAULT_TRUTHY_TOKENS};
use crate::utils::error::{Result, WrapError};
use crate::utils::logger;
use crate::utils::validation::{validate_one_of, validate_tokens, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

const LOG_FORMATS: [&str; 2] = ["compact", "json"];
const DEFAULT_LOG_DIRECTIVE: &str = "wrap_model=info";

/// Process-level settings for model wrapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WrapConfig {
    pub truthy: Option<TruthyConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruthyConfig {
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive such as `wrap_model=debug`.
    pub level: Option<String>,
    /// `compact` or `json`.
    pub format: Option<String>,
}

impl WrapConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(WrapError::IoError)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;

        toml::from_str(&processed).map_err(|e| WrapError::ConfigValidationError {
            field: "wrap_toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value. Unset variables are left
    /// as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        static ENV_VAR: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
        let re = ENV_VAR
            .get_or_init(|| Regex::new(r"\$\{([^}]+)\}"))
            .as_ref()
            .map_err(|e| WrapError::ConfigError {
                message: format!("Invalid substitution pattern: {}", e),
            })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    /// The configured truthy set, or the default one.
    pub fn truthy_tokens(&self) -> TruthyTokens {
        match &self.truthy {
            Some(truthy) => TruthyTokens::new(truthy.tokens.iter().cloned()),
            None => TruthyTokens::new(DEFAULT_TRUTHY_TOKENS),
        }
    }

    pub fn log_directive(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|logging| logging.level.as_deref())
            .unwrap_or(DEFAULT_LOG_DIRECTIVE)
    }

    pub fn json_logging(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|logging| logging.format.as_deref())
            .map(|format| format == "json")
            .unwrap_or(false)
    }

    /// Validates, installs the truthy tokens, then sets up logging.
    ///
    /// Fails, with nothing applied, if the config is invalid or truthy tokens
    /// were already in use. A subscriber installed by the host is kept and the
    /// `[logging]` section is skipped.
    pub fn apply(&self) -> Result<()> {
        self.validate()?;
        install_truthy_tokens(self.truthy_tokens())?;
        if let Err(e) = logger::init_with_directive(self.log_directive(), self.json_logging()) {
            tracing::warn!("Keeping the existing tracing subscriber: {}", e);
        }
        tracing::info!(
            "Applied configuration: {} truthy tokens, log directive '{}'",
            self.truthy_tokens().len(),
            self.log_directive()
        );
        Ok(())
    }
}

impl Validate for WrapConfig {
    fn validate(&self) -> Result<()> {
        if let Some(truthy) = &self.truthy {
            validate_tokens("truthy.tokens", &truthy.tokens)?;
        }

        if let Some(logging) = &self.logging {
            if let Some(format) = &logging.format {
                validate_one_of("logging.format", format, &LOG_FORMATS)?;
            }
            if let Some(level) = &logging.level {
                if level.trim().is_empty() {
                    return Err(WrapError::InvalidConfigValueError {
                        field: "logging.level".to_string(),
                        value: level.clone(),
                        reason: "Log directive cannot be empty".to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = WrapConfig::from_str(
            r#"
            [truthy]
            tokens = ["1", "on"]

            [logging]
            level = "wrap_model=debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert!(config.truthy_tokens().is_truthy("on"));
        assert!(!config.truthy_tokens().is_truthy("yes"));
        assert_eq!(config.log_directive(), "wrap_model=debug");
        assert!(config.json_logging());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = WrapConfig::from_str("").unwrap();
        assert_eq!(config, WrapConfig::default());
        assert!(config.truthy_tokens().is_truthy("yes"));
        assert_eq!(config.log_directive(), DEFAULT_LOG_DIRECTIVE);
        assert!(!config.json_logging());
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("WRAP_MODEL_TEST_TOKEN", "si");
        let config = WrapConfig::from_str(
            r#"
            [truthy]
            tokens = ["${WRAP_MODEL_TEST_TOKEN}", "${WRAP_MODEL_UNSET_VAR}"]
            "#,
        )
        .unwrap();
        let tokens = config.truthy_tokens();
        assert!(tokens.contains("si"));
        assert!(tokens.contains("${WRAP_MODEL_UNSET_VAR}"));
    }

    #[test]
    fn test_validation_failures() {
        let config = WrapConfig::from_str("[truthy]\ntokens = []").unwrap();
        assert!(matches!(
            config.validate(),
            Err(WrapError::InvalidConfigValueError { ref field, .. }) if field == "truthy.tokens"
        ));

        let config = WrapConfig::from_str("[logging]\nformat = \"xml\"").unwrap();
        assert!(config.validate().is_err());

        let config = WrapConfig::from_str("[logging]\nlevel = \" \"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let err = WrapConfig::from_str("[truthy\ntokens = 1").unwrap_err();
        assert!(matches!(err, WrapError::ConfigValidationError { .. }));
        assert!(err.is_config_error());
    }
}
