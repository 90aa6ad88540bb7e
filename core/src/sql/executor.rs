use compact_str::{CompactString, format_compact};

use crate::config::PlannerConfig;
use crate::error::{PlanError, Result};
use crate::plan::{JoinDescriptor, JoinOutcome, JoinRequest, RelationalExecutor};
use crate::schema::{ForeignKeyOn, JoinStrategy, RelationshipSchema};
use crate::tree::JoinNodeKind;
use crate::value::Value;

use super::{ColumnRef, Condition, JoinClause, SelectQuery};

/// Joins relationships onto a [`SelectQuery`] using the schema's keys.
#[derive(Debug, Clone)]
pub struct SqlExecutor<S> {
    schema: S,
    max_alias_length: Option<usize>,
}

impl<S: RelationshipSchema> SqlExecutor<S> {
    pub fn new(schema: S) -> Self {
        Self {
            schema,
            max_alias_length: None,
        }
    }

    /// Uses the config's alias length override, if any.
    pub fn with_config(schema: S, config: &PlannerConfig) -> Self {
        Self {
            schema,
            max_alias_length: config.alias_length_limit(),
        }
    }

    pub fn schema(&self) -> &S {
        &self.schema
    }
}

impl<S: RelationshipSchema> RelationalExecutor for SqlExecutor<S> {
    type Query = SelectQuery;

    fn apply_join(
        &self,
        mut query: SelectQuery,
        request: &JoinRequest<'_>,
    ) -> Result<(SelectQuery, JoinOutcome)> {
        let relationship = request.relationship;
        let branch = match request.kind {
            JoinNodeKind::Root => {
                return Err(PlanError::Execution(format!(
                    "'{}' is the base table and cannot be joined",
                    request.target_type
                )));
            }
            JoinNodeKind::Relationship => None,
            JoinNodeKind::PolymorphicBranch { target_type } => Some(target_type.as_str()),
        };
        if relationship.join_strategy == JoinStrategy::Custom {
            return Ok((query, JoinOutcome::NoJoinAdded));
        }

        let parent = self.schema.resource(request.parent_type)?;
        let target = self.schema.resource(request.target_type)?;
        let parent_alias = request.parent_alias;
        if let Some(limit) = self.max_alias_length {
            query.aliases_mut().set_limit(Some(limit));
        }

        if let Some(through) = &relationship.through {
            let link_alias = query.aliases_mut().alias_for(&through.table, || {
                format_compact!("{}_{}_join", relationship.name, parent_alias)
            });
            query.join(JoinClause {
                join_type: request.join_type,
                table: through.table.clone(),
                alias: link_alias.clone(),
                on: vec![Condition::ColumnsEqual(
                    ColumnRef::new(link_alias.clone(), through.source_key.clone()),
                    ColumnRef::new(parent_alias, parent.primary_key.clone()),
                )],
            });

            let alias = query.aliases_mut().alias_for(&target.table, || {
                format_compact!("{}_{}", relationship.name, parent_alias)
            });
            query.join(JoinClause {
                join_type: request.join_type,
                table: target.table.clone(),
                alias: alias.clone(),
                on: vec![Condition::ColumnsEqual(
                    ColumnRef::new(alias.clone(), target.primary_key.clone()),
                    ColumnRef::new(link_alias, through.target_key.clone()),
                )],
            });
            return Ok((query, added(alias, target.table.clone(), request)));
        }

        let alias = query.aliases_mut().alias_for(&target.table, || match branch {
            Some(target_type) => format_compact!("{}_{}_{}", relationship.name, target_type, parent_alias),
            None => format_compact!("{}_{}", relationship.name, parent_alias),
        });

        let mut on = Vec::with_capacity(2);
        match relationship.foreign_key_on {
            ForeignKeyOn::Source => {
                on.push(Condition::ColumnsEqual(
                    ColumnRef::new(alias.clone(), target.primary_key.clone()),
                    ColumnRef::new(parent_alias, relationship.foreign_key.clone()),
                ));
                if let (Some(target_type), Some(type_column)) = (branch, &relationship.type_column) {
                    on.push(Condition::Equals(
                        ColumnRef::new(parent_alias, type_column.clone()),
                        Value::from(target_type),
                    ));
                }
            }
            ForeignKeyOn::Related => {
                on.push(Condition::ColumnsEqual(
                    ColumnRef::new(alias.clone(), relationship.foreign_key.clone()),
                    ColumnRef::new(parent_alias, parent.primary_key.clone()),
                ));
                if let Some(type_column) = &relationship.type_column {
                    on.push(Condition::Equals(
                        ColumnRef::new(alias.clone(), type_column.clone()),
                        Value::from(request.parent_type),
                    ));
                }
            }
        }

        query.join(JoinClause {
            join_type: request.join_type,
            table: target.table.clone(),
            alias: alias.clone(),
            on,
        });
        Ok((query, added(alias, target.table.clone(), request)))
    }
}

fn added(alias: CompactString, table: CompactString, request: &JoinRequest<'_>) -> JoinOutcome {
    JoinOutcome::Added(JoinDescriptor {
        alias,
        table,
        join_type: request.join_type,
    })
}
