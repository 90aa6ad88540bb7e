//! Batched fragment resolution: one `DISTINCT` query returning identities,
//! cache stamps, sort values and linkage keys.

use compact_str::CompactString;

use crate::config::PlannerConfig;
use crate::error::{PlanError, Result};
use crate::filter::{Direction, Filter, SortCriterion};
use crate::identity::{FragmentSet, ResourceIdentity};
use crate::path::{PathParser, PathSegment};
use crate::plan::{JoinPlan, Joined};
use crate::schema::RelationshipSchema;
use crate::sql::{ColumnRef, Condition, Expr, SelectQuery, SqlExecutor};
use crate::storage::StorageReader;
use crate::tree::{JoinTreeBuilder, child_key, source_key, sourced_path};
use crate::value::{Key, Value};

/// Result window applied to the fragment query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

/// What to resolve. Paths in filters, sort criteria and linkage are
/// relative to the resolved type: the source relationship's target when one
/// is given, else `resource_type` itself.
#[derive(Debug, Clone)]
pub struct FragmentRequest {
    resource_type: CompactString,
    source_relationship: Option<CompactString>,
    source_keys: Option<Vec<Key>>,
    filters: Vec<Filter>,
    sort_criteria: Vec<SortCriterion>,
    linkage: Vec<CompactString>,
    cache: bool,
    page: Option<Page>,
}

impl FragmentRequest {
    pub fn new(resource_type: impl Into<CompactString>) -> Self {
        Self {
            resource_type: resource_type.into(),
            source_relationship: None,
            source_keys: None,
            filters: Vec::new(),
            sort_criteria: Vec::new(),
            linkage: Vec::new(),
            cache: false,
            page: None,
        }
    }

    /// Resolve the resources related to `resource_type` through `name`.
    pub fn source_relationship(mut self, name: impl Into<CompactString>) -> Self {
        self.source_relationship = Some(name.into());
        self
    }

    /// Restricts the starting rows to these primary keys. An empty list
    /// resolves to nothing without running a query.
    pub fn source_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.source_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn sort(mut self, sort: SortCriterion) -> Self {
        self.sort_criteria.push(sort);
        self
    }

    /// Collects the keys of `relationship` into each fragment's `related`.
    pub fn linkage(mut self, relationship: impl Into<CompactString>) -> Self {
        self.linkage.push(relationship.into());
        self
    }

    /// Select each resource's cache field.
    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    pub fn page(mut self, limit: u64, offset: u64) -> Self {
        self.page = Some(Page { limit, offset });
        self
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }
}

/// A resolved type and the path key it was joined under.
struct Subject {
    key: CompactString,
    resource_type: CompactString,
}

struct SubjectColumns {
    resource_type: CompactString,
    key: usize,
    key_ref: ColumnRef,
    cache: Option<usize>,
    linkage: Vec<LinkageColumn>,
}

struct LinkageColumn {
    relationship: CompactString,
    target_type: CompactString,
    index: usize,
}

/// Resolves [`FragmentRequest`]s against a schema and a storage reader.
pub struct FragmentResolver<'a, S: ?Sized, R: ?Sized> {
    schema: &'a S,
    storage: &'a R,
    config: &'a PlannerConfig,
}

impl<'a, S, R> FragmentResolver<'a, S, R>
where
    S: RelationshipSchema + ?Sized,
    R: StorageReader + ?Sized,
{
    pub fn new(schema: &'a S, storage: &'a R, config: &'a PlannerConfig) -> Self {
        Self {
            schema,
            storage,
            config,
        }
    }

    pub fn resolve(&self, request: &FragmentRequest) -> Result<FragmentSet> {
        crate::joinery_profile_function!();

        if request.source_keys.as_ref().is_some_and(Vec::is_empty) {
            return Ok(FragmentSet::new());
        }

        let root = self.schema.resource(&request.resource_type)?;
        let mut subjects = self.subjects(request)?;
        if request.cache {
            for subject in &subjects {
                if self.schema.resource(&subject.resource_type)?.cache_field.is_none() {
                    return Err(PlanError::MissingCacheField(subject.resource_type.clone()));
                }
            }
        }

        let mut builder = JoinTreeBuilder::new(
            self.schema,
            &request.resource_type,
            request.source_relationship.as_deref(),
        )?;
        for filter in &request.filters {
            builder.add_filter(filter)?;
        }
        for sort in &request.sort_criteria {
            builder.add_sort(sort)?;
        }
        for name in &request.linkage {
            builder.add_relationship(name)?;
        }

        let plan = JoinPlan::from_tree(self.schema, builder.build())?;
        let base = SelectQuery::new(self.config.dialect, plan.root_table()).distinct();
        let executor = SqlExecutor::with_config(self.schema, self.config);
        let (plan, mut query) = plan.materialize(&executor, base, self.config)?;

        // A declined source join leaves nothing to resolve against.
        subjects.retain(|subject| {
            let joined = plan.entry(&subject.key).is_some();
            if !joined {
                crate::joinery_warn_no_join!(subject.key, "source branch not resolved");
            }
            joined
        });
        if subjects.is_empty() {
            return Ok(FragmentSet::new());
        }

        let source_column = match request.source_relationship {
            Some(_) => {
                let column = ColumnRef::new(plan.root_alias(), root.primary_key.clone());
                Some((query.select(column.clone()), column))
            }
            None => None,
        };

        let mut layout = Vec::with_capacity(subjects.len());
        for subject in &subjects {
            layout.push(self.select_subject(&plan, &mut query, request, subject)?);
        }

        let mut sort_columns = Vec::with_capacity(request.sort_criteria.len());
        for sort in &request.sort_criteria {
            let columns = self.columns_for(&plan, request, &subjects, sort.path())?;
            if columns.is_empty() {
                continue;
            }
            let expr = Expr::from_columns(columns);
            sort_columns.push((sort.path(), query.select(expr.clone())));
            query.order_by(expr, sort.direction());
        }
        if sort_columns.is_empty() {
            if let Some((_, column)) = &source_column {
                query.order_by(column.clone(), Direction::Asc);
            }
            for subject in &layout {
                query.order_by(subject.key_ref.clone(), Direction::Asc);
            }
        }

        for filter in request.filters.iter().filter(|f| !f.is_custom()) {
            let mut conditions: Vec<Condition> = self
                .columns_for(&plan, request, &subjects, filter.path())?
                .into_iter()
                .map(|column| Condition::In(column, filter.values().to_vec()))
                .collect();
            let condition = match conditions.len() {
                0 => None,
                1 => conditions.pop(),
                _ => Some(Condition::Any(conditions)),
            };
            if let Some(condition) = condition {
                query.and_where(condition);
            }
        }

        if let Some(keys) = &request.source_keys {
            query.and_where(Condition::In(
                ColumnRef::new(plan.root_alias(), root.primary_key.clone()),
                keys.iter().cloned().map(Value::from).collect(),
            ));
        }

        if let Some(page) = request.page {
            query.limit(page.limit);
            query.offset(page.offset);
        }

        #[cfg(feature = "tracing")]
        {
            let (sql, params) = query.build();
            crate::joinery_trace_query!(sql, params.len());
        }
        let rows = self.storage.execute_select(&query)?;

        let mut fragments = FragmentSet::new();
        for row in &rows {
            let source = match &source_column {
                Some((index, _)) => Key::from_value(row.value(*index)?)?
                    .map(|key| ResourceIdentity::new(request.resource_type.clone(), key)),
                None => None,
            };

            for subject in &layout {
                // Polymorphic branches that did not match this row are null.
                let Some(key) = Key::from_value(row.value(subject.key)?)? else {
                    continue;
                };
                let fragment = fragments.entry(ResourceIdentity::new(subject.resource_type.clone(), key));

                if let Some(index) = subject.cache {
                    fragment.set_cache(row.value(index)?.clone());
                }
                for name in &request.linkage {
                    fragment.initialize_related(name);
                }
                for link in &subject.linkage {
                    if let Some(key) = Key::from_value(row.value(link.index)?)? {
                        fragment.add_related_identity(
                            &link.relationship,
                            ResourceIdentity::new(link.target_type.clone(), key),
                        );
                    }
                }
                for (path, index) in &sort_columns {
                    fragment.set_attribute(path, row.value(*index)?.clone());
                }
                if let Some(source) = &source {
                    fragment.add_related_from(source.clone());
                }
            }
        }

        crate::joinery_trace_fragments!(request.resource_type, fragments.len());
        Ok(fragments)
    }

    fn subjects(&self, request: &FragmentRequest) -> Result<Vec<Subject>> {
        match &request.source_relationship {
            Some(name) => {
                let relationship = self.schema.relationship(&request.resource_type, name)?;
                Ok(self
                    .schema
                    .target_types(relationship)
                    .iter()
                    .map(|target| Subject {
                        key: source_key(relationship.polymorphic, target),
                        resource_type: target.clone(),
                    })
                    .collect())
            }
            None => Ok(vec![Subject {
                key: CompactString::const_new(""),
                resource_type: request.resource_type.clone(),
            }]),
        }
    }

    fn select_subject(
        &self,
        plan: &JoinPlan<Joined>,
        query: &mut SelectQuery,
        request: &FragmentRequest,
        subject: &Subject,
    ) -> Result<SubjectColumns> {
        let def = self.schema.resource(&subject.resource_type)?;
        let alias = plan.alias_for(&subject.key)?;

        let key_ref = ColumnRef::new(alias, def.primary_key.clone());
        let key = query.select(key_ref.clone());
        let cache = match (&def.cache_field, request.cache) {
            (Some(field), true) => Some(query.select(ColumnRef::new(alias, field.clone()))),
            _ => None,
        };

        let mut linkage = Vec::new();
        for name in &request.linkage {
            let relationship = self.schema.relationship(&subject.resource_type, name)?;
            for target in self.schema.target_types(relationship) {
                let path_key = child_key(&subject.key, &relationship.name, relationship.polymorphic, target);
                // Joins the executor declined have no alias to read from.
                let Some(entry) = plan.entry(&path_key) else {
                    crate::joinery_warn_no_join!(path_key, "linkage column skipped");
                    continue;
                };
                let target_def = self.schema.resource(target)?;
                let index = query.select(ColumnRef::new(entry.alias.clone(), target_def.primary_key.clone()));
                linkage.push(LinkageColumn {
                    relationship: relationship.name.clone(),
                    target_type: target.clone(),
                    index,
                });
            }
        }

        Ok(SubjectColumns {
            resource_type: subject.resource_type.clone(),
            key,
            key_ref,
            cache,
            linkage,
        })
    }

    /// Columns a path ends on, one per branch it reaches. A path ending on
    /// a relationship yields the related primary key.
    ///
    /// Branches whose join the executor declined are left out, so a filter
    /// or sort reaching only declined joins renders nothing: that part of
    /// the request is left to whoever applies the custom join.
    fn columns_for(
        &self,
        plan: &JoinPlan<Joined>,
        request: &FragmentRequest,
        subjects: &[Subject],
        path: &str,
    ) -> Result<Vec<ColumnRef>> {
        let sourced = sourced_path(request.source_relationship.as_deref(), path);
        let parsed = PathParser::new(self.schema).parse(&request.resource_type, &sourced)?;
        let mut segments = parsed.segments().iter();

        let mut frontier: Vec<(CompactString, CompactString)> = if request.source_relationship.is_some() {
            let pinned = segments
                .next()
                .and_then(PathSegment::as_relationship)
                .and_then(|(_, target)| target);
            subjects
                .iter()
                .filter(|s| pinned.is_none_or(|t| s.resource_type == t))
                .map(|s| (s.key.clone(), s.resource_type.clone()))
                .collect()
        } else {
            vec![(CompactString::const_new(""), request.resource_type.clone())]
        };

        let mut field = None;
        for segment in segments {
            match segment {
                PathSegment::Relationship {
                    relationship,
                    explicit_target,
                } => {
                    let mut next = Vec::new();
                    for (key, resource_type) in &frontier {
                        let rel = self.schema.relationship(resource_type, &relationship.name)?;
                        match explicit_target {
                            Some(target) => next.push((
                                child_key(key, &rel.name, rel.polymorphic, target),
                                target.clone(),
                            )),
                            None => next.extend(self.schema.target_types(rel).iter().map(|target| {
                                (child_key(key, &rel.name, rel.polymorphic, target), target.clone())
                            })),
                        }
                    }
                    frontier = next;
                }
                PathSegment::Field { name } => field = Some(name.clone()),
            }
        }

        let mut columns = Vec::with_capacity(frontier.len());
        for (key, resource_type) in &frontier {
            let Some(entry) = plan.entry(key) else {
                crate::joinery_warn_no_join!(key, "path condition skipped");
                continue;
            };
            let column = match &field {
                Some(field) => field.clone(),
                None => self.schema.resource(resource_type)?.primary_key.clone(),
            };
            columns.push(ColumnRef::new(entry.alias.clone(), column));
        }
        Ok(columns)
    }
}

/// Resolves `request` with the built-in SQL executor and `storage`.
pub fn resolve_fragments<S, R>(
    schema: &S,
    storage: &R,
    request: &FragmentRequest,
    config: &PlannerConfig,
) -> Result<FragmentSet>
where
    S: RelationshipSchema + ?Sized,
    R: StorageReader + ?Sized,
{
    FragmentResolver::new(schema, storage, config).resolve(request)
}
