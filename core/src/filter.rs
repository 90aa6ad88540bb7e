//! Filters and sort criteria as the planner sees them: a path plus what the
//! join must guarantee.

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::join::Requirement;
use crate::value::Value;

/// A filter on a dotted path. Rendered as `IN (...)` over the path's
/// terminal column, or over the related key for a relationship reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    path: CompactString,
    values: SmallVec<[Value; 4]>,
    requirement: Requirement,
    custom: bool,
    perform_joins: bool,
}

impl Filter {
    pub fn new<I, V>(path: impl Into<CompactString>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            path: path.into(),
            values: values.into_iter().map(Into::into).collect(),
            requirement: Requirement::Optional,
            custom: false,
            perform_joins: true,
        }
    }

    /// A filter applied by the caller rather than rendered into the
    /// fragment query. It contributes joins only with
    /// [`perform_joins(true)`](Self::perform_joins).
    pub fn custom(path: impl Into<CompactString>) -> Self {
        Self {
            path: path.into(),
            values: SmallVec::new(),
            requirement: Requirement::Optional,
            custom: true,
            perform_joins: false,
        }
    }

    /// Require matching related rows: the joins along this path become inner.
    pub fn required(mut self) -> Self {
        self.requirement = Requirement::Required;
        self
    }

    pub fn perform_joins(mut self, perform: bool) -> Self {
        self.perform_joins = perform;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn requirement(&self) -> Requirement {
        self.requirement
    }

    pub fn is_custom(&self) -> bool {
        self.custom
    }

    pub fn contributes_joins(&self) -> bool {
        !self.custom || self.perform_joins
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub const fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Ordering on a dotted path. The sorted value is also returned as a
/// fragment attribute keyed by the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortCriterion {
    path: CompactString,
    direction: Direction,
}

impl SortCriterion {
    pub fn new(path: impl Into<CompactString>, direction: Direction) -> Self {
        Self {
            path: path.into(),
            direction,
        }
    }

    pub fn asc(path: impl Into<CompactString>) -> Self {
        Self::new(path, Direction::Asc)
    }

    pub fn desc(path: impl Into<CompactString>) -> Self {
        Self::new(path, Direction::Desc)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}
