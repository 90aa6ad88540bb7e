//! Planner configuration, loadable from a `joinery.toml` file.
//!
//! ```toml
//! dialect = "postgresql"
//! strict_joins = true
//! max_alias_length = 48
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dialect::Dialect;
use crate::error::PlanError;

/// Default config file name.
pub const CONFIG_FILE: &str = "joinery.toml";

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerConfig {
    /// Dialect used to render fragment queries.
    pub dialect: Dialect,
    /// Treat a join the executor declined to add as a hard failure instead
    /// of a warning.
    pub strict_joins: bool,
    /// Overrides the dialect's identifier length limit for generated aliases.
    pub max_alias_length: Option<usize>,
}

impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn strict_joins(mut self, strict: bool) -> Self {
        self.strict_joins = strict;
        self
    }

    pub fn max_alias_length(mut self, len: usize) -> Self {
        self.max_alias_length = Some(len);
        self
    }

    /// The alias length limit in effect: the explicit override, else the
    /// dialect's identifier limit.
    pub fn alias_length_limit(&self) -> Option<usize> {
        self.max_alias_length
            .or_else(|| self.dialect.max_identifier_length())
    }

    /// Load from the default config file
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.into())
            } else {
                ConfigError::Io(path.into(), e)
            }
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_alias_length == Some(0) {
            return Err(ConfigError::Invalid("max_alias_length must be positive".into()));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    InvalidSchema(#[from] PlanError),
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults() {
        let cfg: PlannerConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, PlannerConfig::default());
        assert_eq!(cfg.dialect, Dialect::SQLite);
        assert!(!cfg.strict_joins);
        assert_eq!(cfg.alias_length_limit(), None);
    }

    #[test]
    fn postgres_limits_aliases() {
        let cfg = PlannerConfig::from_toml_str(r#"dialect = "postgres""#).unwrap();
        assert_eq!(cfg.dialect, Dialect::PostgreSQL);
        assert_eq!(cfg.alias_length_limit(), Some(63));
    }

    #[test]
    fn explicit_limit_wins() {
        let cfg = PlannerConfig::from_toml_str(
            r#"
            dialect = "mysql"
            strict_joins = true
            max_alias_length = 12
            "#,
        )
        .unwrap();
        assert!(cfg.strict_joins);
        assert_eq!(cfg.alias_length_limit(), Some(12));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let err = PlannerConfig::from_toml_str("max_alias_length = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_key_is_a_parse_error() {
        let err = PlannerConfig::from_toml_str("stict_joins = true").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "strict_joins = true").unwrap();
        let cfg = PlannerConfig::load_from(file.path()).unwrap();
        assert!(cfg.strict_joins);
    }

    #[test]
    fn missing_file() {
        let err = PlannerConfig::load_from(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
