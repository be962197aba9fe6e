use serde::{Deserialize, Serialize};
use std::fmt;

// NewType pattern for type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassificationCode(pub String);

impl ClassificationCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Everything before the last hyphen, or the whole code when bare.
    pub fn group(&self) -> &str {
        match self.0.rsplit_once('-') {
            Some((group, _)) => group,
            None => &self.0,
        }
    }

    pub fn level(&self) -> Option<&str> {
        self.0.rsplit_once('-').map(|(_, level)| level)
    }

    pub fn is_bare_group(&self) -> bool {
        !self.0.contains('-')
    }
}

impl fmt::Display for ClassificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
