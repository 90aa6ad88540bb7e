//! Resource and relationship declarations the planner reads from.

mod declaration;
mod relationship;

pub use relationship::{Cardinality, ForeignKeyOn, JoinStrategy, JoinTable, Relationship};

use std::collections::BTreeMap;
use std::sync::Arc;

use compact_str::{CompactString, format_compact};
use hashbrown::HashMap;

use crate::error::{PlanError, Result};

/// A declared resource type: its table, key, attributes and relationships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDef {
    pub name: CompactString,
    pub table: CompactString,
    pub primary_key: CompactString,
    /// Column carrying the cache stamp (e.g. `updated_at`).
    pub cache_field: Option<CompactString>,
    pub attributes: Vec<CompactString>,
    relationships: BTreeMap<CompactString, Relationship>,
}

impl ResourceDef {
    /// Creates a resource stored in a table of the same name keyed by `id`.
    pub fn new(name: impl Into<CompactString>) -> Self {
        let name = name.into();
        Self {
            table: name.clone(),
            name,
            primary_key: CompactString::const_new("id"),
            cache_field: None,
            attributes: Vec::new(),
            relationships: BTreeMap::new(),
        }
    }

    pub fn table(mut self, table: impl Into<CompactString>) -> Self {
        self.table = table.into();
        self
    }

    pub fn primary_key(mut self, column: impl Into<CompactString>) -> Self {
        self.primary_key = column.into();
        self
    }

    pub fn cache_field(mut self, column: impl Into<CompactString>) -> Self {
        self.cache_field = Some(column.into());
        self
    }

    pub fn attributes<I, T>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<CompactString>,
    {
        self.attributes.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn relationship(mut self, mut relationship: Relationship) -> Self {
        relationship.parent_type = self.name.clone();
        self.relationships
            .insert(relationship.name.clone(), relationship);
        self
    }

    pub fn get_relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.get(name)
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    /// Whether `name` is a readable column: an attribute, the primary key or
    /// the cache field.
    pub fn has_field(&self, name: &str) -> bool {
        self.primary_key == name
            || self.cache_field.as_deref() == Some(name)
            || self.attributes.iter().any(|a| a == name)
    }
}

/// Read-only relationship metadata consumed by the planner.
pub trait RelationshipSchema {
    fn resource(&self, resource_type: &str) -> Result<&ResourceDef>;

    fn relationship(&self, resource_type: &str, name: &str) -> Result<&Relationship> {
        self.resource(resource_type)?
            .get_relationship(name)
            .ok_or_else(|| PlanError::UnknownRelationship {
                resource_type: resource_type.into(),
                relationship: name.into(),
            })
    }

    fn target_types<'r>(&self, relationship: &'r Relationship) -> &'r [CompactString] {
        &relationship.target_types
    }
}

impl<S: RelationshipSchema + ?Sized> RelationshipSchema for &S {
    fn resource(&self, resource_type: &str) -> Result<&ResourceDef> {
        (**self).resource(resource_type)
    }
}

impl<S: RelationshipSchema + ?Sized> RelationshipSchema for Arc<S> {
    fn resource(&self, resource_type: &str) -> Result<&ResourceDef> {
        (**self).resource(resource_type)
    }
}

/// In-memory [`RelationshipSchema`]. Validated on construction and safe to
/// share across threads.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    resources: HashMap<CompactString, ResourceDef>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Parses and validates a TOML schema declaration.
    ///
    /// ```toml
    /// [[resource]]
    /// name = "posts"
    /// cache_field = "updated_at"
    /// attributes = ["title"]
    ///
    /// [[resource.relationship]]
    /// name = "author"
    /// cardinality = "one"
    /// to = "people"
    /// ```
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, crate::config::ConfigError> {
        let declaration: declaration::SchemaDecl =
            toml::from_str(content).map_err(crate::config::ConfigError::Parse)?;
        Ok(declaration.into_builder().build()?)
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(CompactString::as_str)
    }
}

impl RelationshipSchema for Schema {
    fn resource(&self, resource_type: &str) -> Result<&ResourceDef> {
        self.resources
            .get(resource_type)
            .ok_or_else(|| PlanError::UnknownResourceType(resource_type.into()))
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    resources: Vec<ResourceDef>,
}

impl SchemaBuilder {
    pub fn resource(mut self, resource: ResourceDef) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn build(self) -> Result<Schema> {
        let mut resources = HashMap::with_capacity(self.resources.len());
        for resource in self.resources {
            let name = resource.name.clone();
            if resources.insert(name.clone(), resource).is_some() {
                return Err(invalid(format_compact!("resource '{name}' declared twice")));
            }
        }

        for resource in resources.values() {
            for rel in resource.relationships() {
                validate_relationship(&resources, rel)?;
            }
        }

        Ok(Schema { resources })
    }
}

fn validate_relationship(
    resources: &HashMap<CompactString, ResourceDef>,
    rel: &Relationship,
) -> Result<()> {
    let at = format_compact!("{}.{}", rel.parent_type, rel.name);

    if rel.target_types.is_empty() {
        return Err(invalid(format_compact!("{at} has no target types")));
    }
    if !rel.polymorphic && rel.target_types.len() != 1 {
        return Err(invalid(format_compact!(
            "{at} is not polymorphic but names {} targets",
            rel.target_types.len()
        )));
    }
    for target in &rel.target_types {
        if !resources.contains_key(target) {
            return Err(invalid(format_compact!(
                "{at} targets undeclared resource '{target}'"
            )));
        }
    }
    if rel.polymorphic {
        if rel.type_column.is_none() {
            return Err(invalid(format_compact!("{at} is polymorphic without a type column")));
        }
        if rel.cardinality != Cardinality::One || rel.foreign_key_on != ForeignKeyOn::Source {
            return Err(invalid(format_compact!(
                "{at} is polymorphic but does not belong to its target"
            )));
        }
    }
    if rel.through.is_some() && rel.cardinality != Cardinality::Many {
        return Err(invalid(format_compact!("{at} uses a link table but is to-one")));
    }
    if rel.through.is_none() && rel.foreign_key.is_empty() {
        return Err(invalid(format_compact!("{at} has no foreign key")));
    }
    Ok(())
}

fn invalid(message: CompactString) -> PlanError {
    PlanError::InvalidSchema(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog() -> Schema {
        Schema::builder()
            .resource(
                ResourceDef::new("posts")
                    .attributes(["title"])
                    .relationship(Relationship::to_one("author", "people"))
                    .relationship(Relationship::to_many("comments", "comments", "post_id")),
            )
            .resource(ResourceDef::new("people").attributes(["name"]))
            .resource(
                ResourceDef::new("comments")
                    .relationship(Relationship::to_one("post", "posts")),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn relationship_lookup_sets_parent_type() {
        let schema = blog();
        let rel = schema.relationship("posts", "author").unwrap();
        assert_eq!(rel.parent_type, "posts");
        assert_eq!(schema.target_types(rel), ["people"]);
    }

    #[test]
    fn unknown_relationship_is_reported_with_type() {
        let err = blog().relationship("posts", "editor").unwrap_err();
        assert!(matches!(
            err,
            PlanError::UnknownRelationship { ref resource_type, ref relationship }
                if resource_type == "posts" && relationship == "editor"
        ));
    }

    #[test]
    fn unknown_resource_type() {
        assert!(matches!(
            blog().resource("widgets"),
            Err(PlanError::UnknownResourceType(_))
        ));
    }

    #[test]
    fn fields_include_key_and_cache() {
        let def = ResourceDef::new("posts")
            .cache_field("updated_at")
            .attributes(["title"]);
        assert!(def.has_field("id"));
        assert!(def.has_field("updated_at"));
        assert!(def.has_field("title"));
        assert!(!def.has_field("body"));
    }

    #[test]
    fn rejects_undeclared_targets() {
        let err = Schema::builder()
            .resource(
                ResourceDef::new("posts").relationship(Relationship::to_one("author", "people")),
            )
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("undeclared resource 'people'"));
    }

    #[test]
    fn rejects_duplicate_resources() {
        let err = Schema::builder()
            .resource(ResourceDef::new("posts"))
            .resource(ResourceDef::new("posts"))
            .build()
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidSchema(_)));
    }

    #[test]
    fn rejects_polymorphic_to_many() {
        let mut rel = Relationship::polymorphic_to_one("imageable", ["posts"]);
        rel.cardinality = Cardinality::Many;
        let err = Schema::builder()
            .resource(ResourceDef::new("posts"))
            .resource(ResourceDef::new("pictures").relationship(rel))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("does not belong to its target"));
    }
}
