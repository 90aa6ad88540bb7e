//! Serde shapes for declaring a schema in TOML.

use compact_str::CompactString;
use serde::Deserialize;
use smallvec::SmallVec;

use super::{
    Cardinality, ForeignKeyOn, JoinStrategy, JoinTable, Relationship, ResourceDef, SchemaBuilder,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct SchemaDecl {
    #[serde(default, rename = "resource")]
    resources: Vec<ResourceDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResourceDecl {
    name: CompactString,
    table: Option<CompactString>,
    primary_key: Option<CompactString>,
    cache_field: Option<CompactString>,
    #[serde(default)]
    attributes: Vec<CompactString>,
    #[serde(default, rename = "relationship")]
    relationships: Vec<RelationshipDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RelationshipDecl {
    name: CompactString,
    cardinality: Cardinality,
    to: Targets,
    #[serde(default)]
    polymorphic: bool,
    foreign_key: Option<CompactString>,
    foreign_key_on: Option<ForeignKeyOn>,
    type_column: Option<CompactString>,
    through: Option<JoinTable>,
    inverse: Option<CompactString>,
    #[serde(default)]
    join: JoinStrategy,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Targets {
    One(CompactString),
    Many(Vec<CompactString>),
}

impl Targets {
    fn into_vec(self) -> SmallVec<[CompactString; 2]> {
        match self {
            Targets::One(t) => SmallVec::from_elem(t, 1),
            Targets::Many(ts) => ts.into_iter().collect(),
        }
    }
}

impl SchemaDecl {
    pub(super) fn into_builder(self) -> SchemaBuilder {
        self.resources
            .into_iter()
            .fold(SchemaBuilder::default(), |builder, decl| {
                builder.resource(decl.into_def())
            })
    }
}

impl ResourceDecl {
    fn into_def(self) -> ResourceDef {
        let mut def = ResourceDef::new(self.name).attributes(self.attributes);
        if let Some(table) = self.table {
            def = def.table(table);
        }
        if let Some(pk) = self.primary_key {
            def = def.primary_key(pk);
        }
        if let Some(cache) = self.cache_field {
            def = def.cache_field(cache);
        }
        self.relationships
            .into_iter()
            .fold(def, |def, rel| def.relationship(rel.into_relationship()))
    }
}

impl RelationshipDecl {
    fn into_relationship(self) -> Relationship {
        let targets = self.to.into_vec();
        let first = targets.first().cloned().unwrap_or_default();

        let mut rel = if self.polymorphic {
            Relationship::polymorphic_to_one(self.name, targets)
        } else {
            match (self.cardinality, self.through) {
                (Cardinality::Many, Some(through)) => {
                    Relationship::many_to_many(self.name, first, through)
                }
                (Cardinality::Many, None) => Relationship::to_many(
                    self.name,
                    first,
                    self.foreign_key.clone().unwrap_or_default(),
                ),
                (Cardinality::One, through) => {
                    let mut rel = Relationship::to_one(self.name, first);
                    rel.through = through;
                    rel
                }
            }
        };

        // Keep what was declared so validation sees it, even when it is invalid.
        rel.cardinality = self.cardinality;
        if let Some(fk) = self.foreign_key {
            rel.foreign_key = fk;
        }
        if let Some(on) = self.foreign_key_on {
            rel.foreign_key_on = on;
        }
        if let Some(column) = self.type_column {
            rel.type_column = Some(column);
        }
        rel.inverse = self.inverse;
        rel.join_strategy = self.join;
        rel
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ConfigError;
    use crate::schema::{RelationshipSchema, Schema};

    use super::*;

    const BLOG: &str = r#"
        [[resource]]
        name = "posts"
        cache_field = "updated_at"
        attributes = ["title", "body"]

        [[resource.relationship]]
        name = "author"
        cardinality = "one"
        to = "people"

        [[resource.relationship]]
        name = "tags"
        cardinality = "many"
        to = "tags"
        through = { table = "posts_tags", source_key = "post_id", target_key = "tag_id" }

        [[resource]]
        name = "people"
        table = "people"
        attributes = ["name"]

        [[resource]]
        name = "tags"

        [[resource]]
        name = "pictures"

        [[resource.relationship]]
        name = "imageable"
        cardinality = "one"
        polymorphic = true
        to = ["posts", "people"]
    "#;

    #[test]
    fn parses_blog_declaration() {
        let schema = Schema::from_toml_str(BLOG).unwrap();

        let posts = schema.resource("posts").unwrap();
        assert_eq!(posts.cache_field.as_deref(), Some("updated_at"));
        assert!(posts.has_field("body"));

        let author = schema.relationship("posts", "author").unwrap();
        assert_eq!(author.foreign_key, "author_id");

        let tags = schema.relationship("posts", "tags").unwrap();
        assert_eq!(tags.through.as_ref().unwrap().target_key, "tag_id");

        let imageable = schema.relationship("pictures", "imageable").unwrap();
        assert!(imageable.polymorphic);
        assert_eq!(imageable.target_types.as_slice(), ["people", "posts"]);
        assert_eq!(imageable.type_column.as_deref(), Some("imageable_type"));
    }

    #[test]
    fn validation_errors_surface_as_schema_errors() {
        let err = Schema::from_toml_str(
            r#"
            [[resource]]
            name = "posts"
            [[resource.relationship]]
            name = "author"
            cardinality = "one"
            to = "people"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSchema(_)));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let err = Schema::from_toml_str(
            r#"
            [[resource]]
            name = "posts"
            colour = "blue"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
