//! Dotted relationship paths such as `comments.author.name` or
//! `imageable#documents.name`.

use std::fmt;

use compact_str::CompactString;
use smallvec::{SmallVec, smallvec};

use crate::error::{PlanError, Result};
use crate::schema::{Relationship, RelationshipSchema};

/// Separates the hops of a path.
pub const SEGMENT_SEPARATOR: char = '.';
/// Pins a polymorphic relationship to one of its target types.
pub const TYPE_DISCRIMINATOR: char = '#';

/// One hop of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A relationship traversal. `explicit_target` is set when the path pinned
    /// a polymorphic relationship with `#type`.
    Relationship {
        relationship: Relationship,
        explicit_target: Option<CompactString>,
    },
    /// The terminal attribute. Always last.
    Field { name: CompactString },
}

impl PathSegment {
    pub fn as_relationship(&self) -> Option<(&Relationship, Option<&str>)> {
        match self {
            PathSegment::Relationship {
                relationship,
                explicit_target,
            } => Some((relationship, explicit_target.as_deref())),
            PathSegment::Field { .. } => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Relationship {
                relationship,
                explicit_target: Some(target),
            } => write!(f, "{}{TYPE_DISCRIMINATOR}{target}", relationship.name),
            PathSegment::Relationship { relationship, .. } => f.write_str(&relationship.name),
            PathSegment::Field { name } => f.write_str(name),
        }
    }
}

/// A path resolved against the schema, relative to `resource_type`.
///
/// When a polymorphic hop is not pinned, the segments after it were checked
/// against every target type; the [`Relationship`] stored for such segments
/// is the one declared on the first target type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    resource_type: CompactString,
    segments: SmallVec<[PathSegment; 4]>,
}

impl Path {
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The relationship hops, without the terminal field.
    pub fn relationship_segments(&self) -> impl Iterator<Item = (&Relationship, Option<&str>)> {
        self.segments.iter().filter_map(PathSegment::as_relationship)
    }

    /// The terminal field, or `None` for a whole-relationship reference.
    pub fn field(&self) -> Option<&str> {
        match self.segments.last() {
            Some(PathSegment::Field { name }) => Some(name),
            _ => None,
        }
    }

    /// Whether the path ends on a relationship rather than an attribute.
    pub fn is_relationship_reference(&self) -> bool {
        self.field().is_none()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEGMENT_SEPARATOR}")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Resolves path strings against a [`RelationshipSchema`]. Pure.
pub struct PathParser<'s, S: ?Sized> {
    schema: &'s S,
}

impl<'s, S: RelationshipSchema + ?Sized> PathParser<'s, S> {
    pub fn new(schema: &'s S) -> Self {
        Self { schema }
    }

    pub fn parse(&self, resource_type: &str, path: &str) -> Result<Path> {
        // Fail on unknown origin types before looking at tokens.
        self.schema.resource(resource_type)?;

        let tokens: SmallVec<[&str; 4]> = path.split(SEGMENT_SEPARATOR).collect();
        let mut segments = SmallVec::new();
        let mut current: SmallVec<[CompactString; 2]> = smallvec![resource_type.into()];

        for (idx, token) in tokens.iter().enumerate() {
            let last = idx + 1 == tokens.len();
            let (name, discriminator) = match token.split_once(TYPE_DISCRIMINATOR) {
                Some((name, target)) => (name, Some(target)),
                None => (*token, None),
            };

            let Some((first, rest)) = current.split_first() else {
                return Err(PlanError::InvalidSchema(format!(
                    "path '{path}' reaches no resource type before '{name}'"
                )));
            };
            match self.schema.relationship(first, name) {
                Ok(relationship) => {
                    for other in rest {
                        self.schema.relationship(other, name)?;
                    }
                    let next = self.next_types(&current, name, discriminator, relationship)?;
                    segments.push(PathSegment::Relationship {
                        relationship: relationship.clone(),
                        explicit_target: discriminator.map(Into::into),
                    });
                    current = next;
                }
                Err(PlanError::UnknownRelationship { .. }) if last && discriminator.is_none() => {
                    for ty in &current {
                        if !self.schema.resource(ty)?.has_field(name) {
                            return Err(PlanError::UnknownField {
                                resource_type: ty.clone(),
                                field: name.into(),
                            });
                        }
                    }
                    segments.push(PathSegment::Field { name: name.into() });
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Path {
            resource_type: resource_type.into(),
            segments,
        })
    }

    /// The types reachable after traversing `name` from every type in `current`.
    fn next_types(
        &self,
        current: &[CompactString],
        name: &str,
        discriminator: Option<&str>,
        relationship: &Relationship,
    ) -> Result<SmallVec<[CompactString; 2]>> {
        if let Some(target) = discriminator {
            if !relationship.polymorphic || !relationship.reaches(target) {
                return Err(PlanError::InvalidTypeDiscriminator {
                    relationship: relationship.name.clone(),
                    target: target.into(),
                });
            }
            return Ok(smallvec![target.into()]);
        }

        let mut next: SmallVec<[CompactString; 2]> = SmallVec::new();
        for ty in current {
            let rel = self.schema.relationship(ty, name)?;
            next.extend(self.schema.target_types(rel).iter().cloned());
        }
        next.sort();
        next.dedup();
        Ok(next)
    }
}
