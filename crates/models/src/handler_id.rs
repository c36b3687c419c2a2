use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ResolutionError;

/// A configured handler identifier, `module.path:function`.
///
/// The legacy form `module.function` (no colon) is also accepted; the last
/// `.` then separates the module path from the function name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HandlerId {
    pub module: String,
    pub function: String,
}

impl HandlerId {
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            function: function.into(),
        }
    }
}

fn is_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl FromStr for HandlerId {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ResolutionError::InvalidIdentifier {
            identifier: s.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid("identifier is empty"));
        }

        let (module, function) = match trimmed.split_once(':') {
            Some(parts) => parts,
            None => trimmed
                .rsplit_once('.')
                .ok_or_else(|| invalid("expected 'module:function' or 'module.function'"))?,
        };

        if !is_ident(function) {
            return Err(invalid("function name must be a non-empty identifier"));
        }
        if !module.split(['.', '/']).all(is_ident) {
            return Err(invalid("module path segments must be non-empty identifiers"));
        }

        Ok(HandlerId::new(module.replace('/', "."), function))
    }
}

impl TryFrom<String> for HandlerId {
    type Error = ResolutionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HandlerId> for String {
    fn from(id: HandlerId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.function)
    }
}
