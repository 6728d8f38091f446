//! Campaign environment names.
//!
//! Every environment is a separate storage namespace: scores and state of one
//! campaign never leak into another unless explicitly restored.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// A validated campaign environment name (`[a-z0-9_-]`, at most 64 chars,
/// starting with a letter or digit).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Environment(String);

impl Environment {
    pub const MAX_LEN: usize = 64;

    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let valid_char = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_';
        let starts_ok = raw
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
        if !starts_ok || raw.len() > Self::MAX_LEN || !raw.chars().all(valid_char) {
            return Err(TypesError::InvalidEnvironment(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Environment {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Environment> for String {
    fn from(e: Environment) -> Self {
        e.0
    }
}
