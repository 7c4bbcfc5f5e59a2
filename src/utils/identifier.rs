use crate::error::{FleetError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// A process, service or project name restricted to `[A-Za-z0-9_-]`.
///
/// Construction is the only validation point: a value of this type can be
/// handed to the executor as a single argv element without further checks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    pub fn new(candidate: impl Into<String>) -> Result<Self> {
        let candidate = candidate.into();
        if candidate.is_empty() {
            return Err(FleetError::validation("identifier must not be empty"));
        }
        if sanitize(&candidate) != candidate {
            return Err(FleetError::validation(format!(
                "invalid name '{}': only letters, digits, '-' and '_' are allowed",
                candidate.escape_debug()
            )));
        }
        Ok(Self(candidate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Keeps only the characters an identifier may contain.
///
/// A detector, not an escaper: compare the result with the input and reject
/// on mismatch. `Identifier::new` does exactly that.
pub fn sanitize(candidate: &str) -> String {
    candidate
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

impl TryFrom<String> for Identifier {
    type Error = FleetError;

    fn try_from(value: String) -> Result<Self> {
        Identifier::new(value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        for name in ["apps-dev", "webhook_as_builts", "A1", "-"] {
            assert_eq!(Identifier::new(name).unwrap().as_str(), name);
        }
    }

    #[test]
    fn rejects_anything_outside_the_charset() {
        let hostile = [
            "apps-dev; rm -rf /",
            "name with space",
            "$(whoami)",
            "a/b",
            "svc.service",
            "ünïcode",
            "tab\tname",
        ];
        for candidate in hostile {
            assert_ne!(sanitize(candidate), candidate);
            let err = Identifier::new(candidate).unwrap_err();
            assert_eq!(err.kind(), "validation", "{candidate:?} should be rejected");
        }
    }

    #[test]
    fn rejects_empty_name() {
        assert!(Identifier::new("").is_err());
    }

    #[test]
    fn sanitize_differs_whenever_a_foreign_char_is_present() {
        for c in ['.', ' ', ';', '|', '&', '$', '`', '\n', '/', '\\', '"', '\''] {
            let candidate = format!("svc{}x", c);
            assert_ne!(sanitize(&candidate), candidate);
        }
    }

    #[test]
    fn deserializes_through_validation() {
        let ok: Identifier = serde_json::from_str("\"wordsearch\"").unwrap();
        assert_eq!(ok.as_str(), "wordsearch");

        let bad = serde_json::from_str::<Identifier>("\"word search\"");
        assert!(bad.is_err());
    }
}
