//! Merging relationship paths from filters, sorts and includes into one
//! join tree.
//!
//! The tree alternates between resource types and relationships: the root
//! [`ResourceNode`] holds the starting type, each [`JoinTreeNode`] is one
//! relationship off its parent type, and its children are one
//! [`ResourceNode`] per target type joined. Children are kept in ordered maps
//! so the same set of paths always produces the same tree, whatever order
//! they arrive in.

use std::collections::BTreeMap;

use compact_str::{CompactString, format_compact};
use smallvec::SmallVec;

use crate::error::Result;
use crate::filter::{Filter, SortCriterion};
use crate::join::JoinType;
use crate::path::{PathParser, PathSegment, SEGMENT_SEPARATOR, TYPE_DISCRIMINATOR};
use crate::schema::{Relationship, RelationshipSchema};

/// A resource type reached by the tree and the relationships joined off it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    resource_type: CompactString,
    relationships: BTreeMap<CompactString, JoinTreeNode>,
}

impl ResourceNode {
    fn new(resource_type: impl Into<CompactString>) -> Self {
        Self {
            resource_type: resource_type.into(),
            relationships: BTreeMap::new(),
        }
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn relationship(&self, name: &str) -> Option<&JoinTreeNode> {
        self.relationships.get(name)
    }

    pub fn relationships(&self) -> impl Iterator<Item = &JoinTreeNode> {
        self.relationships.values()
    }
}

/// One relationship join, keyed by its parent type and relationship name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTreeNode {
    relationship: Relationship,
    join_type: JoinType,
    is_source: bool,
    children: BTreeMap<CompactString, ResourceNode>,
}

impl JoinTreeNode {
    pub fn relationship(&self) -> &Relationship {
        &self.relationship
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    pub fn is_source(&self) -> bool {
        self.is_source
    }

    /// The branch joined for `target_type`.
    pub fn branch(&self, target_type: &str) -> Option<&ResourceNode> {
        self.children.get(target_type)
    }

    pub fn branches(&self) -> impl Iterator<Item = &ResourceNode> {
        self.children.values()
    }
}

/// How a flattened join is materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinNodeKind {
    /// The starting table itself.
    Root,
    /// A relationship with a single target type.
    Relationship,
    /// One target type of a polymorphic relationship.
    PolymorphicBranch { target_type: CompactString },
}

/// Where a flattened join hangs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    Root,
    Node(CompactString),
}

/// A join ready for execution, in depth order.
#[derive(Debug, Clone)]
pub struct FlatJoin<'t> {
    pub depth: usize,
    pub path_key: CompactString,
    pub parent: ParentRef,
    pub parent_type: &'t str,
    pub target_type: &'t str,
    pub relationship: &'t Relationship,
    pub join_type: JoinType,
    pub is_source: bool,
    pub kind: JoinNodeKind,
}

/// The merged tree for one plan. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTree {
    root: ResourceNode,
    source: Option<CompactString>,
}

impl JoinTree {
    pub fn root(&self) -> &ResourceNode {
        &self.root
    }

    pub fn resource_type(&self) -> &str {
        &self.root.resource_type
    }

    /// The source relationship node, if the plan is scoped by one.
    pub fn source(&self) -> Option<&JoinTreeNode> {
        self.source
            .as_deref()
            .and_then(|name| self.root.relationship(name))
    }

    /// Number of joins below the root (one per relationship branch).
    pub fn node_count(&self) -> usize {
        fn count(node: &ResourceNode) -> usize {
            node.relationships
                .values()
                .flat_map(|rel| rel.children.values())
                .map(|child| 1 + count(child))
                .sum()
        }
        count(&self.root)
    }

    /// Flattens the tree breadth-first: every join at depth `n` comes before
    /// any join at depth `n + 1`, siblings in key order.
    pub fn levels(&self) -> Vec<Vec<FlatJoin<'_>>> {
        let mut levels: Vec<Vec<FlatJoin<'_>>> = Vec::new();
        let mut frontier: Vec<(ParentRef, CompactString, &ResourceNode)> =
            vec![(ParentRef::Root, CompactString::const_new(""), &self.root)];
        let mut depth = 1;

        while !frontier.is_empty() {
            let mut level = Vec::new();
            let mut next = Vec::new();

            for (parent, prefix, node) in frontier {
                for (name, rel_node) in &node.relationships {
                    for (target, child) in &rel_node.children {
                        let polymorphic = rel_node.relationship.polymorphic;
                        let path_key = if rel_node.is_source {
                            source_key(polymorphic, target)
                        } else {
                            child_key(&prefix, name, polymorphic, target)
                        };
                        let kind = if polymorphic {
                            JoinNodeKind::PolymorphicBranch {
                                target_type: target.clone(),
                            }
                        } else {
                            JoinNodeKind::Relationship
                        };

                        level.push(FlatJoin {
                            depth,
                            path_key: path_key.clone(),
                            parent: parent.clone(),
                            parent_type: &node.resource_type,
                            target_type: &child.resource_type,
                            relationship: &rel_node.relationship,
                            join_type: rel_node.join_type,
                            is_source: rel_node.is_source,
                            kind,
                        });
                        next.push((ParentRef::Node(path_key.clone()), path_key, child));
                    }
                }
            }

            if level.is_empty() {
                break;
            }
            levels.push(level);
            frontier = next;
            depth += 1;
        }

        levels
    }
}

/// Key of a source branch: `""`, or `#type` for a polymorphic source.
pub(crate) fn source_key(polymorphic: bool, target: &str) -> CompactString {
    if polymorphic {
        format_compact!("{TYPE_DISCRIMINATOR}{target}")
    } else {
        CompactString::const_new("")
    }
}

/// Key of a join below `prefix`: `name`, or `name#type` for a polymorphic
/// relationship.
pub(crate) fn child_key(prefix: &str, name: &str, polymorphic: bool, target: &str) -> CompactString {
    let segment = if polymorphic {
        format_compact!("{name}{TYPE_DISCRIMINATOR}{target}")
    } else {
        CompactString::from(name)
    };
    if prefix.is_empty() {
        segment
    } else {
        format_compact!("{prefix}{SEGMENT_SEPARATOR}{segment}")
    }
}

/// Prefixes `path` with the source relationship, if any.
pub(crate) fn sourced_path(source: Option<&str>, path: &str) -> CompactString {
    match source {
        // Polymorphic sources take paths like `#documents.name`.
        Some(source) if path.starts_with(TYPE_DISCRIMINATOR) => format_compact!("{source}{path}"),
        Some(source) => format_compact!("{source}{SEGMENT_SEPARATOR}{path}"),
        None => CompactString::from(path),
    }
}

/// Builds a [`JoinTree`] from paths contributed by filters, sort criteria
/// and relationship includes.
pub struct JoinTreeBuilder<'s, S: ?Sized> {
    schema: &'s S,
    source: Option<Relationship>,
    root: ResourceNode,
}

impl<'s, S: RelationshipSchema + ?Sized> JoinTreeBuilder<'s, S> {
    /// Starts a tree for `resource_type`. A source relationship is joined
    /// before anything else and every later path is relative to its target.
    pub fn new(schema: &'s S, resource_type: &str, source: Option<&str>) -> Result<Self> {
        schema.resource(resource_type)?;
        let mut root = ResourceNode::new(resource_type);

        let source = match source {
            Some(name) => {
                let relationship = schema.relationship(resource_type, name)?.clone();
                let join_type = if relationship.polymorphic {
                    JoinType::Left
                } else {
                    JoinType::Inner
                };
                let children = schema
                    .target_types(&relationship)
                    .iter()
                    .map(|t| (t.clone(), ResourceNode::new(t.clone())))
                    .collect();
                root.relationships.insert(
                    relationship.name.clone(),
                    JoinTreeNode {
                        relationship: relationship.clone(),
                        join_type,
                        is_source: true,
                        children,
                    },
                );
                Some(relationship)
            }
            None => None,
        };

        Ok(Self {
            schema,
            source,
            root,
        })
    }

    /// Adds a dotted path requiring `join_type` on each non-polymorphic hop.
    pub fn add_path(&mut self, path: &str, join_type: JoinType) -> Result<&mut Self> {
        let sourced = self.sourced_path(path);
        let parsed = PathParser::new(self.schema).parse(&self.root.resource_type, &sourced)?;
        insert_segments(self.schema, &mut self.root, parsed.segments(), join_type)?;
        Ok(self)
    }

    /// Adds a filter's path. Custom filters only contribute joins when they
    /// ask for them.
    pub fn add_filter(&mut self, filter: &Filter) -> Result<&mut Self> {
        if filter.contributes_joins() {
            self.add_path(filter.path(), filter.requirement().into())?;
        }
        Ok(self)
    }

    /// Adds a sort criterion's path. Sorting never drops rows, so its joins are left joins.
    pub fn add_sort(&mut self, sort: &SortCriterion) -> Result<&mut Self> {
        self.add_path(sort.path(), JoinType::Left)
    }

    /// Adds an included relationship path, joined left.
    pub fn add_relationship(&mut self, path: &str) -> Result<&mut Self> {
        self.add_path(path, JoinType::Left)
    }

    pub fn build(self) -> JoinTree {
        JoinTree {
            root: self.root,
            source: self.source.map(|rel| rel.name),
        }
    }

    fn sourced_path(&self, path: &str) -> CompactString {
        sourced_path(self.source.as_ref().map(|rel| rel.name.as_str()), path)
    }
}

fn insert_segments<S: RelationshipSchema + ?Sized>(
    schema: &S,
    node: &mut ResourceNode,
    segments: &[PathSegment],
    requested: JoinType,
) -> Result<()> {
    let Some((PathSegment::Relationship {
        relationship,
        explicit_target,
    }, rest)) = segments.split_first()
    else {
        return Ok(());
    };

    // Re-resolve on this node's type: after an unpinned polymorphic hop each
    // branch has its own declaration of the relationship.
    let relationship = schema.relationship(&node.resource_type, &relationship.name)?;
    let join_type = if relationship.polymorphic {
        JoinType::Left
    } else {
        requested
    };

    let rel_node = node
        .relationships
        .entry(relationship.name.clone())
        .and_modify(|existing| existing.join_type = existing.join_type.merge(join_type))
        .or_insert_with(|| JoinTreeNode {
            relationship: relationship.clone(),
            join_type,
            is_source: false,
            children: BTreeMap::new(),
        });

    let targets: SmallVec<[CompactString; 2]> = match explicit_target {
        Some(target) => SmallVec::from_elem(target.clone(), 1),
        None => schema.target_types(relationship).iter().cloned().collect(),
    };

    for target in targets {
        let child = rel_node
            .children
            .entry(target.clone())
            .or_insert_with(|| ResourceNode::new(target));
        insert_segments(schema, child, rest, requested)?;
    }
    Ok(())
}
