//! Relationship metadata between resource types.

use compact_str::{CompactString, format_compact};
use serde::Deserialize;
use smallvec::{SmallVec, smallvec};

/// Whether a relationship points at one resource or many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    One,
    Many,
}

/// Which side of the relationship holds the foreign key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyOn {
    /// The source table holds the key (belongs-to).
    Source,
    /// The related table holds the key (has-one / has-many).
    Related,
}

/// How the executor should join a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStrategy {
    #[default]
    Standard,
    /// The join is applied by caller-supplied filter code; the built-in
    /// executor adds nothing for it.
    Custom,
}

/// Link table for many-to-many relationships.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JoinTable {
    /// The link table name (e.g., `"posts_tags"`).
    pub table: CompactString,
    /// Column in the link table pointing at the source row (e.g., `"post_id"`).
    pub source_key: CompactString,
    /// Column in the link table pointing at the target row (e.g., `"tag_id"`).
    pub target_key: CompactString,
}

impl JoinTable {
    pub fn new(
        table: impl Into<CompactString>,
        source_key: impl Into<CompactString>,
        target_key: impl Into<CompactString>,
    ) -> Self {
        Self {
            table: table.into(),
            source_key: source_key.into(),
            target_key: target_key.into(),
        }
    }
}

/// A named, typed edge from one resource type to one or more target types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub name: CompactString,
    /// The resource type declaring this relationship. Set when the
    /// relationship is added to a [`ResourceDef`](super::ResourceDef).
    pub parent_type: CompactString,
    pub cardinality: Cardinality,
    pub polymorphic: bool,
    pub target_types: SmallVec<[CompactString; 2]>,
    pub foreign_key: CompactString,
    pub foreign_key_on: ForeignKeyOn,
    /// Type discriminator column. For a polymorphic relationship it lives on
    /// the source table; for a non-polymorphic one (`polymorphic_as`) it lives
    /// on the related table and holds the parent type name.
    pub type_column: Option<CompactString>,
    pub through: Option<JoinTable>,
    pub inverse: Option<CompactString>,
    pub join_strategy: JoinStrategy,
}

impl Relationship {
    /// A to-one relationship whose key `<name>_id` lives on the source table.
    pub fn to_one(name: impl Into<CompactString>, target: impl Into<CompactString>) -> Self {
        let name = name.into();
        Self {
            foreign_key: format_compact!("{name}_id"),
            name,
            parent_type: CompactString::const_new(""),
            cardinality: Cardinality::One,
            polymorphic: false,
            target_types: smallvec![target.into()],
            foreign_key_on: ForeignKeyOn::Source,
            type_column: None,
            through: None,
            inverse: None,
            join_strategy: JoinStrategy::Standard,
        }
    }

    /// A to-many relationship whose key lives on the related table.
    pub fn to_many(
        name: impl Into<CompactString>,
        target: impl Into<CompactString>,
        foreign_key: impl Into<CompactString>,
    ) -> Self {
        Self {
            name: name.into(),
            parent_type: CompactString::const_new(""),
            cardinality: Cardinality::Many,
            polymorphic: false,
            target_types: smallvec![target.into()],
            foreign_key: foreign_key.into(),
            foreign_key_on: ForeignKeyOn::Related,
            type_column: None,
            through: None,
            inverse: None,
            join_strategy: JoinStrategy::Standard,
        }
    }

    /// A to-many relationship through a link table.
    pub fn many_to_many(
        name: impl Into<CompactString>,
        target: impl Into<CompactString>,
        through: JoinTable,
    ) -> Self {
        let mut rel = Self::to_many(name, target, through.source_key.clone());
        rel.through = Some(through);
        rel
    }

    /// A polymorphic to-one relationship: `<name>_id` and `<name>_type` live
    /// on the source table and the type column names the target type.
    pub fn polymorphic_to_one<I, T>(name: impl Into<CompactString>, targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<CompactString>,
    {
        let name = name.into();
        let mut target_types: SmallVec<[CompactString; 2]> =
            targets.into_iter().map(Into::into).collect();
        target_types.sort();
        Self {
            foreign_key: format_compact!("{name}_id"),
            type_column: Some(format_compact!("{name}_type")),
            name,
            parent_type: CompactString::const_new(""),
            cardinality: Cardinality::One,
            polymorphic: true,
            target_types,
            foreign_key_on: ForeignKeyOn::Source,
            through: None,
            inverse: None,
            join_strategy: JoinStrategy::Standard,
        }
    }

    pub fn foreign_key(mut self, column: impl Into<CompactString>) -> Self {
        self.foreign_key = column.into();
        self
    }

    /// Moves the foreign key to the related table (has-one).
    pub fn has_one(mut self, foreign_key: impl Into<CompactString>) -> Self {
        self.foreign_key = foreign_key.into();
        self.foreign_key_on = ForeignKeyOn::Related;
        self
    }

    pub fn type_column(mut self, column: impl Into<CompactString>) -> Self {
        self.type_column = Some(column.into());
        self
    }

    /// Marks the related table as holding a type discriminator column that
    /// must equal this relationship's parent type.
    pub fn polymorphic_as(self, type_column: impl Into<CompactString>) -> Self {
        self.type_column(type_column)
    }

    pub fn inverse(mut self, name: impl Into<CompactString>) -> Self {
        self.inverse = Some(name.into());
        self
    }

    pub fn custom_join(mut self) -> Self {
        self.join_strategy = JoinStrategy::Custom;
        self
    }

    pub fn is_to_one(&self) -> bool {
        self.cardinality == Cardinality::One
    }

    /// Whether `target` is one of the types this relationship reaches.
    pub fn reaches(&self, target: &str) -> bool {
        self.target_types.iter().any(|t| t == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_one_defaults_foreign_key() {
        let rel = Relationship::to_one("author", "people");
        assert_eq!(rel.foreign_key, "author_id");
        assert_eq!(rel.foreign_key_on, ForeignKeyOn::Source);
        assert!(rel.is_to_one());
        assert!(!rel.polymorphic);
    }

    #[test]
    fn polymorphic_targets_are_sorted() {
        let rel = Relationship::polymorphic_to_one("imageable", ["products", "documents"]);
        assert_eq!(rel.target_types.as_slice(), ["documents", "products"]);
        assert_eq!(rel.type_column.as_deref(), Some("imageable_type"));
        assert!(rel.reaches("products"));
        assert!(!rel.reaches("people"));
    }

    #[test]
    fn many_to_many_keeps_link_table() {
        let rel = Relationship::many_to_many(
            "tags",
            "tags",
            JoinTable::new("posts_tags", "post_id", "tag_id"),
        );
        assert_eq!(rel.cardinality, Cardinality::Many);
        assert_eq!(rel.through.as_ref().map(|t| t.table.as_str()), Some("posts_tags"));
    }
}
