//! # Joinery
//!
//! Join planning for resource graphs: merge relationship paths from filters,
//! sort criteria and includes into one alias-safe join plan, then resolve
//! identities, cache stamps and linkage keys in a single query.
//!
//! ## Quick Start
//!
//! ```rust
//! use joinery::prelude::*;
//!
//! # fn main() -> joinery::Result<()> {
//! let schema = Schema::builder()
//!     .resource(
//!         ResourceDef::new("posts")
//!             .attributes(["title"])
//!             .relationship(Relationship::to_one("author", "people"))
//!             .relationship(Relationship::to_many("comments", "comments", "post_id")),
//!     )
//!     .resource(ResourceDef::new("people").attributes(["name"]))
//!     .resource(
//!         ResourceDef::new("comments")
//!             .relationship(Relationship::to_one("author", "people")),
//!     )
//!     .build()?;
//!
//! let filters = [
//!     Filter::new("author.name", ["Ann"]).required(),
//!     Filter::new("comments.author.name", ["Bo"]),
//! ];
//! let plan = build_plan(&schema, "posts", None, &[], &filters, &[])?;
//!
//! let config = PlannerConfig::default();
//! let base = SelectQuery::new(config.dialect, plan.root_table());
//! let (plan, query) = plan.materialize(&SqlExecutor::new(&schema), base, &config)?;
//!
//! assert_eq!(plan.alias_for("author")?, "people");
//! assert_eq!(plan.alias_for("comments.author")?, "author_comments");
//! assert_eq!(query.joins().len(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Storage Support
//!
//! | Database | Driver   | Feature Flag |
//! |----------|----------|--------------|
//! | SQLite   | rusqlite | `rusqlite`   |
//!
//! Any other store can implement [`StorageReader`](core::storage::StorageReader)
//! or bring its own [`RelationalExecutor`](core::plan::RelationalExecutor).

pub use joinery_core as core;

pub use joinery_core::{ConfigError, PlanError, Result, build_plan, resolve_fragments};

#[cfg(feature = "rusqlite")]
pub use rusqlite;

pub mod prelude {
    pub use joinery_core::{
        Dialect, Direction, Filter, FragmentRequest, FragmentResolver, FragmentSet, JoinPlan,
        JoinType, Key, PlanError, PlannerConfig, Relationship, RelationshipSchema,
        ResourceDef, ResourceFragment, ResourceIdentity, Schema, SelectQuery, SortCriterion,
        SqlExecutor, StorageReader, Value, build_plan, resolve_fragments,
    };
    pub use joinery_core::schema::JoinTable;
}
