//! Join strengths and how they combine.

use std::fmt;

// =============================================================================
// Join Type Enum
// =============================================================================

/// The strength of a join in a plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum JoinType {
    /// The synthetic root: the base table itself, never joined.
    Root,
    Inner,
    #[default]
    Left,
}

impl JoinType {
    /// Combines two requirements for the same node. Inner absorbs left.
    pub const fn merge(self, other: JoinType) -> JoinType {
        match (self, other) {
            (JoinType::Root, _) | (_, JoinType::Root) => JoinType::Root,
            (JoinType::Left, JoinType::Left) => JoinType::Left,
            _ => JoinType::Inner,
        }
    }

    /// The SQL keyword introducing this join.
    pub const fn keyword(self) -> &'static str {
        match self {
            JoinType::Root => "FROM",
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT OUTER JOIN",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JoinType::Root => "root",
            JoinType::Inner => "inner",
            JoinType::Left => "left",
        })
    }
}

/// Whether a filter needs matching related rows to exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Requirement {
    /// Unmatched rows are kept (left join).
    #[default]
    Optional,
    /// Unmatched rows are dropped (inner join).
    Required,
}

impl From<Requirement> for JoinType {
    fn from(value: Requirement) -> Self {
        match value {
            Requirement::Optional => JoinType::Left,
            Requirement::Required => JoinType::Inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_absorbs_left() {
        assert_eq!(JoinType::Left.merge(JoinType::Inner), JoinType::Inner);
        assert_eq!(JoinType::Inner.merge(JoinType::Left), JoinType::Inner);
        assert_eq!(JoinType::Inner.merge(JoinType::Inner), JoinType::Inner);
        assert_eq!(JoinType::Left.merge(JoinType::Left), JoinType::Left);
    }

    #[test]
    fn root_is_sticky() {
        assert_eq!(JoinType::Root.merge(JoinType::Inner), JoinType::Root);
    }

    #[test]
    fn keywords() {
        assert_eq!(JoinType::Inner.keyword(), "INNER JOIN");
        assert_eq!(JoinType::Left.keyword(), "LEFT OUTER JOIN");
        assert_eq!(JoinType::from(Requirement::Required), JoinType::Inner);
    }
}
