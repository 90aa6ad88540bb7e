//! The boundary between the planner and whatever builds the joined query.

use compact_str::CompactString;

use crate::error::Result;
use crate::join::JoinType;
use crate::schema::Relationship;
use crate::tree::JoinNodeKind;

/// One join the planner wants added.
#[derive(Debug, Clone, Copy)]
pub struct JoinRequest<'a> {
    /// Alias the parent table was joined under.
    pub parent_alias: &'a str,
    pub parent_type: &'a str,
    pub relationship: &'a Relationship,
    /// The branch being joined. For a polymorphic relationship this is one
    /// of several targets, each joined separately.
    pub target_type: &'a str,
    pub join_type: JoinType,
    pub kind: &'a JoinNodeKind,
}

/// What the executor actually joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinDescriptor {
    pub alias: CompactString,
    /// The table the alias refers to.
    pub table: CompactString,
    pub join_type: JoinType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Added(JoinDescriptor),
    /// The executor skipped this join, e.g. for a relationship whose join is
    /// applied by caller code.
    NoJoinAdded,
}

/// Adds joins to a query and reports the alias it chose for each one.
///
/// Implementations take the query by value and hand back the extended query
/// along with an explicit [`JoinOutcome`]; the planner never inspects query
/// internals to find out what was added.
pub trait RelationalExecutor {
    type Query;

    fn apply_join(
        &self,
        query: Self::Query,
        request: &JoinRequest<'_>,
    ) -> Result<(Self::Query, JoinOutcome)>;
}

impl<E: RelationalExecutor + ?Sized> RelationalExecutor for &E {
    type Query = E::Query;

    fn apply_join(
        &self,
        query: Self::Query,
        request: &JoinRequest<'_>,
    ) -> Result<(Self::Query, JoinOutcome)> {
        (**self).apply_join(query, request)
    }
}
