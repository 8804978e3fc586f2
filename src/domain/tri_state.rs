use crate::utils::error::{Result, WrapError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::sync::OnceLock;

/// An optional boolean that keeps "absent" apart from an explicit `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriStateBool {
    #[default]
    NotSet,
    True,
    False,
}

impl TriStateBool {
    pub const fn from_bool(value: bool) -> Self {
        if value {
            TriStateBool::True
        } else {
            TriStateBool::False
        }
    }

    pub const fn is_set(self) -> bool {
        !matches!(self, TriStateBool::NotSet)
    }

    pub const fn is_true(self) -> bool {
        matches!(self, TriStateBool::True)
    }

    /// True for both `False` and `NotSet`. Not the same as [`is_false`](Self::is_false).
    pub const fn not_true(self) -> bool {
        !self.is_true()
    }

    pub const fn is_false(self) -> bool {
        matches!(self, TriStateBool::False)
    }

    pub const fn bool_value(self, default: bool) -> bool {
        match self {
            TriStateBool::True => true,
            TriStateBool::False => false,
            TriStateBool::NotSet => default,
        }
    }

    /// Usable with `#[serde(skip_serializing_if = "TriStateBool::is_not_set")]`.
    pub fn is_not_set(&self) -> bool {
        !self.is_set()
    }
}

impl From<bool> for TriStateBool {
    fn from(value: bool) -> Self {
        TriStateBool::from_bool(value)
    }
}

impl From<Option<bool>> for TriStateBool {
    fn from(value: Option<bool>) -> Self {
        value.map_or(TriStateBool::NotSet, TriStateBool::from_bool)
    }
}

impl From<TriStateBool> for Option<bool> {
    fn from(value: TriStateBool) -> Self {
        match value {
            TriStateBool::NotSet => None,
            TriStateBool::True => Some(true),
            TriStateBool::False => Some(false),
        }
    }
}

impl Serialize for TriStateBool {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        Option::<bool>::from(*self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TriStateBool {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Option::<bool>::deserialize(deserializer).map(TriStateBool::from)
    }
}

pub const DEFAULT_TRUTHY_TOKENS: [&str; 5] = ["1", "T", "t", "Y", "y"];

/// Case-sensitive strings that mark free text as true.
///
/// A text is truthy when the set holds the whole text or its first character,
/// so with the default set "true", "Yes" and "1" all read as true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruthyTokens {
    tokens: HashSet<String>,
}

impl TruthyTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn as_set(&self) -> &HashSet<String> {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn is_truthy(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        if self.tokens.contains(text) {
            return true;
        }
        text.chars()
            .next()
            .map(|first| {
                let mut buf = [0u8; 4];
                self.tokens.contains(&*first.encode_utf8(&mut buf))
            })
            .unwrap_or(false)
    }

    /// Empty text reads as `NotSet`; anything else is `True` or `False`.
    pub fn parse_tri_state(&self, text: &str) -> TriStateBool {
        if text.is_empty() {
            TriStateBool::NotSet
        } else {
            TriStateBool::from_bool(self.is_truthy(text))
        }
    }
}

impl Default for TruthyTokens {
    fn default() -> Self {
        Self::new(DEFAULT_TRUTHY_TOKENS)
    }
}

static TRUTHY_TOKENS: OnceLock<TruthyTokens> = OnceLock::new();

/// The process-wide truthy token set, initialised to the default on first use.
pub fn truthy_tokens() -> &'static TruthyTokens {
    TRUTHY_TOKENS.get_or_init(TruthyTokens::default)
}

/// Installs the process-wide token set. Only the first install (or first read)
/// decides the set.
pub fn install_truthy_tokens(tokens: TruthyTokens) -> Result<()> {
    TRUTHY_TOKENS.set(tokens).map_err(|_| WrapError::ConfigError {
        message: "Truthy tokens are already initialized".to_string(),
    })?;
    tracing::debug!("Installed {} truthy tokens", truthy_tokens().len());
    Ok(())
}
