//! Join plans: a merged [`JoinTree`] materialized against a
//! [`RelationalExecutor`], addressable by path key.

mod alias;
mod executor;

pub use alias::AliasRegistry;
pub use executor::{JoinDescriptor, JoinOutcome, JoinRequest, RelationalExecutor};

use std::marker::PhantomData;

use compact_str::CompactString;

use crate::config::PlannerConfig;
use crate::error::{PlanError, Result};
use crate::filter::{Filter, SortCriterion};
use crate::join::JoinType;
use crate::schema::RelationshipSchema;
use crate::tree::{JoinTree, JoinTreeBuilder, ParentRef};

pub use crate::tree::JoinNodeKind;

mod sealed {
    pub trait Sealed {}
}

/// Build state of a [`JoinPlan`].
pub trait PlanState: sealed::Sealed {}

/// The tree is merged but no joins have been added yet.
#[derive(Debug, Clone, Copy)]
pub struct Built;
/// Every join has been materialized and aliases are known.
#[derive(Debug, Clone, Copy)]
pub struct Joined;

impl sealed::Sealed for Built {}
impl sealed::Sealed for Joined {}
impl PlanState for Built {}
impl PlanState for Joined {}

/// One materialized join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPlanEntry {
    pub path_key: CompactString,
    pub alias: CompactString,
    pub join_type: JoinType,
    /// Resource type reached by this join.
    pub resource_type: CompactString,
    pub kind: JoinNodeKind,
}

/// A join plan for one logical query.
///
/// A plan is materialized exactly once: [`JoinPlan::materialize`] consumes
/// the `Built` plan and returns a `Joined` one, which has no `materialize`.
///
/// ```compile_fail
/// use joinery_core::PlannerConfig;
/// use joinery_core::plan::{Built, JoinPlan, RelationalExecutor};
///
/// fn twice<E: RelationalExecutor>(
///     plan: JoinPlan<Built>,
///     executor: &E,
///     first: E::Query,
///     second: E::Query,
///     config: &PlannerConfig,
/// ) {
///     let (joined, _query) = plan.materialize(executor, first, config).unwrap();
///     let _ = joined.materialize(executor, second, config);
/// }
/// ```
///
/// A built plan cannot be copied to get a second run either:
///
/// ```compile_fail
/// use joinery_core::PlannerConfig;
/// use joinery_core::plan::{Built, JoinPlan, RelationalExecutor};
///
/// fn copied<E: RelationalExecutor>(
///     plan: JoinPlan<Built>,
///     executor: &E,
///     first: E::Query,
///     second: E::Query,
///     config: &PlannerConfig,
/// ) {
///     let _ = plan.clone().materialize(executor, first, config);
///     let _ = plan.materialize(executor, second, config);
/// }
/// ```
#[derive(Debug)]
pub struct JoinPlan<State: PlanState = Built> {
    tree: JoinTree,
    root_table: CompactString,
    root_alias: CompactString,
    entries: Vec<JoinPlanEntry>,
    skipped: Vec<CompactString>,
    _state: PhantomData<State>,
}

/// Builds a plan for `resource_type` from every path that needs a join.
pub fn build_plan<S: RelationshipSchema + ?Sized>(
    schema: &S,
    resource_type: &str,
    source_relationship: Option<&str>,
    relationships: &[&str],
    filters: &[Filter],
    sort_criteria: &[SortCriterion],
) -> Result<JoinPlan<Built>> {
    crate::joinery_profile_function!();

    let mut builder = JoinTreeBuilder::new(schema, resource_type, source_relationship)?;
    for filter in filters {
        builder.add_filter(filter)?;
    }
    for sort in sort_criteria {
        builder.add_sort(sort)?;
    }
    for path in relationships {
        builder.add_relationship(path)?;
    }
    JoinPlan::from_tree(schema, builder.build())
}

impl<State: PlanState> JoinPlan<State> {
    pub fn tree(&self) -> &JoinTree {
        &self.tree
    }

    pub fn resource_type(&self) -> &str {
        self.tree.resource_type()
    }

    /// Table of the starting resource type.
    pub fn root_table(&self) -> &str {
        &self.root_table
    }
}

impl JoinPlan<Built> {
    /// Wraps an already merged tree.
    pub fn from_tree<S: RelationshipSchema + ?Sized>(schema: &S, tree: JoinTree) -> Result<Self> {
        let root_table = schema.resource(tree.resource_type())?.table.clone();
        crate::joinery_trace_plan!(tree.resource_type(), tree.node_count());
        Ok(Self {
            tree,
            root_alias: root_table.clone(),
            root_table,
            entries: Vec::new(),
            skipped: Vec::new(),
            _state: PhantomData,
        })
    }

    /// Adds every join in the tree to `base_query`, shallowest first.
    ///
    /// The base table keeps its own table name as alias. Any alias
    /// collision, duplicate path key or executor failure aborts the whole
    /// plan. A join the executor declines is logged and left without an
    /// alias, unless `config.strict_joins` is set.
    pub fn materialize<E: RelationalExecutor + ?Sized>(
        self,
        executor: &E,
        base_query: E::Query,
        config: &PlannerConfig,
    ) -> Result<(JoinPlan<Joined>, E::Query)> {
        crate::joinery_profile_scope!("plan", "materialize");

        let JoinPlan {
            tree,
            root_table,
            root_alias,
            mut entries,
            mut skipped,
            ..
        } = self;

        let mut registry = AliasRegistry::new();
        if tree.source().is_some() {
            registry.reserve(&root_alias)?;
        } else {
            registry.claim("", &root_alias)?;
            entries.push(JoinPlanEntry {
                path_key: CompactString::const_new(""),
                alias: root_alias.clone(),
                join_type: JoinType::Root,
                resource_type: tree.resource_type().into(),
                kind: JoinNodeKind::Root,
            });
        }

        let mut query = base_query;
        for level in tree.levels() {
            for join in level {
                let parent_alias = match &join.parent {
                    ParentRef::Root => root_alias.as_str(),
                    ParentRef::Node(key) => match registry.alias_for(key) {
                        Some(alias) => alias,
                        None => {
                            crate::joinery_warn_no_join!(join.path_key, "parent join was not added");
                            skipped.push(join.path_key);
                            continue;
                        }
                    },
                };

                let request = JoinRequest {
                    parent_alias,
                    parent_type: join.parent_type,
                    relationship: join.relationship,
                    target_type: join.target_type,
                    join_type: join.join_type,
                    kind: &join.kind,
                };
                let (next, outcome) = executor.apply_join(query, &request)?;
                query = next;

                match outcome {
                    JoinOutcome::Added(descriptor) => {
                        registry.claim(&join.path_key, &descriptor.alias)?;
                        crate::joinery_trace_join!(join.path_key, descriptor.alias, descriptor.join_type);
                        entries.push(JoinPlanEntry {
                            path_key: join.path_key,
                            alias: descriptor.alias,
                            join_type: descriptor.join_type,
                            resource_type: join.target_type.into(),
                            kind: join.kind,
                        });
                    }
                    JoinOutcome::NoJoinAdded if config.strict_joins => {
                        return Err(PlanError::JoinNotAdded(join.path_key));
                    }
                    JoinOutcome::NoJoinAdded => {
                        crate::joinery_warn_no_join!(join.path_key, "executor added no join");
                        skipped.push(join.path_key);
                    }
                }
            }
        }

        let plan = JoinPlan {
            tree,
            root_table,
            root_alias,
            entries,
            skipped,
            _state: PhantomData,
        };
        Ok((plan, query))
    }
}

impl Clone for JoinPlan<Joined> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
            root_table: self.root_table.clone(),
            root_alias: self.root_alias.clone(),
            entries: self.entries.clone(),
            skipped: self.skipped.clone(),
            _state: PhantomData,
        }
    }
}

impl JoinPlan<Joined> {
    /// The alias a path key was joined under. Keys of joins the executor
    /// skipped are not found.
    pub fn alias_for(&self, path_key: &str) -> Result<&str> {
        self.entry(path_key)
            .map(|entry| entry.alias.as_str())
            .ok_or_else(|| PlanError::AliasNotFound(path_key.into()))
    }

    pub fn entry(&self, path_key: &str) -> Option<&JoinPlanEntry> {
        self.entries.iter().find(|entry| entry.path_key == path_key)
    }

    /// Alias of the base table.
    pub fn root_alias(&self) -> &str {
        &self.root_alias
    }

    /// Materialized joins in execution order, the root first when it has a
    /// path key.
    pub fn entries(&self) -> &[JoinPlanEntry] {
        &self.entries
    }

    /// Path keys left without an alias because no join was added.
    pub fn skipped(&self) -> &[CompactString] {
        &self.skipped
    }
}
