//! Alias bookkeeping for one plan instance.

use compact_str::CompactString;
use hashbrown::HashMap;

use crate::error::{PlanError, Result};

/// Label recorded for an alias reserved without a path key.
const RESERVED: &str = "<root>";

/// Tracks which join claimed which alias. One registry per plan, never shared.
#[derive(Debug, Clone, Default)]
pub struct AliasRegistry {
    /// alias -> path key (or the reserved label)
    owners: HashMap<CompactString, CompactString>,
    /// path key -> alias
    aliases: HashMap<CompactString, CompactString>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `path_key` was materialized under `alias`.
    ///
    /// Claiming a path key twice, or an alias already held by another join,
    /// fails. Either failure must abort the plan.
    pub fn claim(&mut self, path_key: &str, alias: &str) -> Result<()> {
        if self.aliases.contains_key(path_key) {
            return Err(PlanError::DuplicatePathKey(path_key.into()));
        }
        if let Some(existing) = self.owners.get(alias) {
            return Err(PlanError::AliasCollision {
                alias: alias.into(),
                existing: existing.clone(),
                incoming: path_key.into(),
            });
        }
        self.owners.insert(alias.into(), path_key.into());
        self.aliases.insert(path_key.into(), alias.into());
        Ok(())
    }

    /// Holds `alias` without binding a path key to it, e.g. the base table
    /// when the plan is scoped by a source relationship.
    pub fn reserve(&mut self, alias: &str) -> Result<()> {
        if let Some(existing) = self.owners.get(alias) {
            return Err(PlanError::AliasCollision {
                alias: alias.into(),
                existing: existing.clone(),
                incoming: RESERVED.into(),
            });
        }
        self.owners.insert(alias.into(), RESERVED.into());
        Ok(())
    }

    pub fn alias_for(&self, path_key: &str) -> Option<&str> {
        self.aliases.get(path_key).map(CompactString::as_str)
    }

    pub fn is_claimed(&self, alias: &str) -> bool {
        self.owners.contains_key(alias)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
