//! Runtime environment tag.
//!
//! # Design
//! - The environment is parsed once from host configuration and passed around as
//!   a value; behaviour switches match on the enum, never on strings.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Named runtime environment that drives optional sinks and validation strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Environment {
    /// Local development: structured console output, eager service validation.
    Development,
    /// Pre-production deployment.
    Staging,
    /// Production deployment: telemetry sink enabled.
    #[default]
    Production,
    /// Integration test host.
    Test,
}

impl Environment {
    /// Canonical name of the environment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "Development",
            Self::Staging => "Staging",
            Self::Production => "Production",
            Self::Test => "Test",
        }
    }

    /// Returns `true` for [`Environment::Development`].
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Returns `true` for [`Environment::Production`].
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl Display for Environment {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            _ => Err(ConfigError::InvalidEnvironment {
                value: value.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Environment> for String {
    fn from(value: Environment) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_case_insensitively() -> Result<(), ConfigError> {
        assert_eq!("Development".parse::<Environment>()?, Environment::Development);
        assert_eq!("PRODUCTION".parse::<Environment>()?, Environment::Production);
        assert_eq!(" test ".parse::<Environment>()?, Environment::Test);
        assert_eq!("staging".parse::<Environment>()?, Environment::Staging);
        Ok(())
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "qa".parse::<Environment>().err();
        assert!(matches!(
            err,
            Some(ConfigError::InvalidEnvironment { ref value }) if value == "qa"
        ));
    }

    #[test]
    fn predicates_match_variants() {
        assert!(Environment::Development.is_development());
        assert!(!Environment::Test.is_development());
        assert!(Environment::Production.is_production());
        assert!(!Environment::Staging.is_production());
        assert_eq!(Environment::default(), Environment::Production);
    }
}
