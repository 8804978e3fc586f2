use crate::utils::error::{Result, WrapError};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_non_empty_list(field_name: &str, values: &[String]) -> Result<()> {
    if values.is_empty() {
        return Err(WrapError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: "[]".to_string(),
            reason: "List cannot be empty".to_string(),
        });
    }
    Ok(())
}

pub fn validate_tokens(field_name: &str, tokens: &[String]) -> Result<()> {
    validate_non_empty_list(field_name, tokens)?;

    let mut seen = HashSet::new();
    for token in tokens {
        if token.is_empty() {
            return Err(WrapError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: token.clone(),
                reason: "Token cannot be empty".to_string(),
            });
        }
        if token.chars().any(char::is_whitespace) {
            return Err(WrapError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: token.clone(),
                reason: "Token cannot contain whitespace".to_string(),
            });
        }
        if !seen.insert(token.as_str()) {
            tracing::debug!("Duplicate token '{}' in {}", token, field_name);
        }
    }
    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(WrapError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: format!("Allowed values: {}", allowed.join(", ")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tokens() {
        let tokens = vec!["1".to_string(), "y".to_string()];
        assert!(validate_tokens("truthy.tokens", &tokens).is_ok());

        assert!(validate_tokens("truthy.tokens", &[]).is_err());
        assert!(validate_tokens("truthy.tokens", &["".to_string()]).is_err());
        assert!(validate_tokens("truthy.tokens", &["o n".to_string()]).is_err());
    }

    #[test]
    fn test_duplicate_tokens_are_allowed() {
        let tokens = vec!["y".to_string(), "y".to_string()];
        assert!(validate_tokens("truthy.tokens", &tokens).is_ok());
    }

    #[test]
    fn test_validate_one_of() {
        assert!(validate_one_of("logging.format", "json", &["compact", "json"]).is_ok());
        let err = validate_one_of("logging.format", "xml", &["compact", "json"]).unwrap_err();
        assert!(err.to_string().contains("compact, json"));
    }
}
