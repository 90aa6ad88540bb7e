//! Join alias assignment for the built-in executor.

use compact_str::{CompactString, format_compact};
use hashbrown::HashMap;

/// Hands out table aliases the way relational ORMs do.
///
/// The first use of a table gets the bare table name. Later uses get the
/// candidate name supplied by the caller (`<relationship>_<parent alias>`),
/// and repeats of that candidate get `_2`, `_3`, ... Every alias is cut to
/// the identifier length limit, so two long candidates may come out equal.
#[derive(Debug, Clone, Default)]
pub struct AliasTracker {
    counts: HashMap<CompactString, usize>,
    limit: Option<usize>,
}

impl AliasTracker {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            counts: HashMap::new(),
            limit,
        }
    }

    /// Records the base table, which is always aliased by its own name.
    pub fn with_base(mut self, table: &str) -> Self {
        self.counts.insert(table.into(), 1);
        self
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
    }

    /// Picks the alias for the next join of `table`.
    pub fn alias_for(
        &mut self,
        table: &str,
        candidate: impl FnOnce() -> CompactString,
    ) -> CompactString {
        let uses = self.counts.entry(table.into()).or_insert(0);
        *uses += 1;
        if *uses == 1 {
            return truncate(table, self.limit);
        }

        let candidate = candidate();
        let uses = self.counts.entry(candidate.clone()).or_insert(0);
        *uses += 1;
        match *uses {
            1 => truncate(&candidate, self.limit),
            n => {
                let suffix = format_compact!("_{n}");
                let base = truncate(&candidate, self.limit.map(|l| l.saturating_sub(suffix.len())));
                format_compact!("{base}{suffix}")
            }
        }
    }
}

fn truncate(name: &str, limit: Option<usize>) -> CompactString {
    match limit {
        Some(limit) if name.len() > limit => {
            let mut end = limit;
            while !name.is_char_boundary(end) {
                end -= 1;
            }
            CompactString::from(&name[..end])
        }
        _ => CompactString::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_use_is_the_table_name() {
        let mut tracker = AliasTracker::new(None).with_base("posts");
        assert_eq!(tracker.alias_for("people", || "author_posts".into()), "people");
        assert_eq!(
            tracker.alias_for("people", || "author_comments".into()),
            "author_comments"
        );
        assert_eq!(tracker.alias_for("posts", || "parent_posts".into()), "parent_posts");
    }

    #[test]
    fn repeated_candidates_are_numbered() {
        let mut tracker = AliasTracker::new(None).with_base("people");
        assert_eq!(tracker.alias_for("people", || "friends_people".into()), "friends_people");
        assert_eq!(tracker.alias_for("people", || "friends_people".into()), "friends_people_2");
        assert_eq!(tracker.alias_for("people", || "friends_people".into()), "friends_people_3");
    }

    #[test]
    fn truncation_can_collide() {
        let mut tracker = AliasTracker::new(Some(10)).with_base("people");
        let a = tracker.alias_for("people", || "reviewers_comments".into());
        let b = tracker.alias_for("people", || "reviewers_commenters".into());
        assert_eq!(a, "reviewers_");
        assert_eq!(a, b);
    }

    #[test]
    fn numbered_aliases_respect_the_limit() {
        let mut tracker = AliasTracker::new(Some(8)).with_base("tags");
        tracker.alias_for("tags", || "tags_posts".into());
        let second = tracker.alias_for("tags", || "tags_posts".into());
        assert_eq!(second, "tags_p_2");
    }
}
