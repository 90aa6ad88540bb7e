//! Resource identities and the fragments resolved for them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use compact_str::CompactString;
use hashbrown::HashMap;

use crate::value::{Key, Value};

/// Identifies a single resource: its type name and primary key.
///
/// Ordered by `(resource_type, key)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceIdentity {
    resource_type: CompactString,
    key: Key,
}

impl ResourceIdentity {
    pub fn new(resource_type: impl Into<CompactString>, key: impl Into<Key>) -> Self {
        Self {
            resource_type: resource_type.into(),
            key: key.into(),
        }
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn key(&self) -> &Key {
        &self.key
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.key)
    }
}

/// The minimal per-resource record produced by a batched fetch: identity,
/// cache stamp, sort attributes and linkage identities.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceFragment {
    pub identity: ResourceIdentity,
    pub cache: Option<Value>,
    pub attributes: BTreeMap<CompactString, Value>,
    pub related: BTreeMap<CompactString, BTreeSet<ResourceIdentity>>,
    /// Source-side identities whose rows led to this fragment.
    pub related_from: BTreeSet<ResourceIdentity>,
}

impl ResourceFragment {
    pub fn new(identity: ResourceIdentity) -> Self {
        Self {
            identity,
            cache: None,
            attributes: BTreeMap::new(),
            related: BTreeMap::new(),
            related_from: BTreeSet::new(),
        }
    }

    /// Ensures an (empty) linkage set exists for `relationship`.
    pub fn initialize_related(&mut self, relationship: &str) {
        self.related.entry(relationship.into()).or_default();
    }

    pub fn add_related_identity(&mut self, relationship: &str, identity: ResourceIdentity) {
        self.related
            .entry(relationship.into())
            .or_default()
            .insert(identity);
    }

    pub fn add_related_from(&mut self, identity: ResourceIdentity) {
        self.related_from.insert(identity);
    }

    /// Sets the cache stamp. The first non-null stamp wins.
    pub fn set_cache(&mut self, value: Value) {
        if self.cache.is_none() && !value.is_null() {
            self.cache = Some(value);
        }
    }

    pub fn set_attribute(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    pub fn related(&self, relationship: &str) -> Option<&BTreeSet<ResourceIdentity>> {
        self.related.get(relationship)
    }
}

/// Fragments keyed by identity, iterated in the order they were first seen.
#[derive(Debug, Clone, Default)]
pub struct FragmentSet {
    index: HashMap<ResourceIdentity, usize>,
    fragments: Vec<ResourceFragment>,
}

impl FragmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the fragment for `identity`, seeding an empty one on first use.
    pub fn entry(&mut self, identity: ResourceIdentity) -> &mut ResourceFragment {
        let idx = match self.index.get(&identity) {
            Some(idx) => *idx,
            None => {
                let idx = self.fragments.len();
                self.index.insert(identity.clone(), idx);
                self.fragments.push(ResourceFragment::new(identity));
                idx
            }
        };
        &mut self.fragments[idx]
    }

    pub fn get(&self, identity: &ResourceIdentity) -> Option<&ResourceFragment> {
        self.index.get(identity).map(|idx| &self.fragments[*idx])
    }

    pub fn contains(&self, identity: &ResourceIdentity) -> bool {
        self.index.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceFragment> {
        self.fragments.iter()
    }

    pub fn identities(&self) -> impl Iterator<Item = &ResourceIdentity> {
        self.fragments.iter().map(|f| &f.identity)
    }

    pub fn into_map(self) -> BTreeMap<ResourceIdentity, ResourceFragment> {
        self.fragments
            .into_iter()
            .map(|f| (f.identity.clone(), f))
            .collect()
    }
}

impl IntoIterator for FragmentSet {
    type Item = ResourceFragment;
    type IntoIter = std::vec::IntoIter<ResourceFragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.into_iter()
    }
}
