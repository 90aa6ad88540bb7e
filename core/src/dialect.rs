//! SQL dialects and their rendering differences.

use std::borrow::Cow;

use serde::Deserialize;

/// SQL dialect targeted by the built-in query renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    #[serde(alias = "sqlite3")]
    SQLite,
    #[serde(alias = "postgres")]
    PostgreSQL,
    MySQL,
}

impl Dialect {
    /// Renders a placeholder for this dialect with the given 1-based index.
    ///
    /// Returns `Cow::Borrowed("?")` for SQLite/MySQL (zero allocation),
    /// `Cow::Owned` for PostgreSQL numbered placeholders.
    ///
    /// # Examples
    /// - PostgreSQL: `$1`, `$2`, `$3`
    /// - SQLite/MySQL: `?`
    #[inline]
    pub fn render_placeholder(&self, index: usize) -> Cow<'static, str> {
        match self {
            Dialect::PostgreSQL => Cow::Owned(format!("${}", index)),
            Dialect::SQLite | Dialect::MySQL => Cow::Borrowed("?"),
        }
    }

    /// Character wrapping quoted identifiers. Doubled inside a name.
    pub const fn identifier_quote(&self) -> char {
        match self {
            Dialect::SQLite | Dialect::PostgreSQL => '"',
            Dialect::MySQL => '`',
        }
    }

    /// Longest identifier the database accepts, if it enforces one.
    pub const fn max_identifier_length(&self) -> Option<usize> {
        match self {
            Dialect::SQLite => None,
            Dialect::PostgreSQL => Some(63),
            Dialect::MySQL => Some(64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders() {
        assert_eq!(Dialect::SQLite.render_placeholder(3), "?");
        assert_eq!(Dialect::PostgreSQL.render_placeholder(3), "$3");
    }

    #[test]
    fn identifier_limits() {
        assert_eq!(Dialect::SQLite.max_identifier_length(), None);
        assert_eq!(Dialect::PostgreSQL.max_identifier_length(), Some(63));
    }

    #[test]
    fn mysql_uses_backticks() {
        assert_eq!(Dialect::MySQL.identifier_quote(), '`');
        assert_eq!(Dialect::SQLite.identifier_quote(), '"');
    }
}
