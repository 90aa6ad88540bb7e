//! Relationship-path join planning and batched fragment resolution.
//!
//! Paths such as `comments.author.name` arrive from filters, sort criteria
//! and relationship includes. The planner merges them into one
//! [`JoinTree`](tree::JoinTree), materializes it through a
//! [`RelationalExecutor`](plan::RelationalExecutor) while recording the alias
//! of every join, and the [`FragmentResolver`](fragment::FragmentResolver)
//! uses the resulting plan to fetch identities, cache stamps and linkage keys
//! in a single query.

pub mod config;
pub mod dialect;
pub mod error;
pub mod filter;
pub mod fragment;
pub mod identity;
pub mod join;
pub mod path;
pub mod plan;
pub mod profiling;
pub mod schema;
pub mod sql;
pub mod storage;
mod trace;
pub mod tree;
pub mod value;

// Re-export key types and traits
pub use config::{ConfigError, PlannerConfig};
pub use dialect::Dialect;
pub use error::{PlanError, Result};
pub use filter::{Direction, Filter, SortCriterion};
pub use fragment::{FragmentRequest, FragmentResolver, Page, resolve_fragments};
pub use identity::{FragmentSet, ResourceFragment, ResourceIdentity};
pub use join::{JoinType, Requirement};
pub use path::{Path, PathParser, PathSegment};
pub use plan::{
    AliasRegistry, Built, JoinDescriptor, JoinNodeKind, JoinOutcome, JoinPlan, JoinPlanEntry,
    JoinRequest, Joined, RelationalExecutor, build_plan,
};
pub use schema::{
    Cardinality, ForeignKeyOn, JoinStrategy, JoinTable, Relationship, RelationshipSchema,
    ResourceDef, Schema, SchemaBuilder,
};
pub use sql::{SelectQuery, SqlExecutor};
pub use storage::{Row, StorageReader};
pub use tree::{JoinTree, JoinTreeBuilder};
pub use value::{Key, Value};
