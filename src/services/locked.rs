//! Locked-tag enforcement.
//!
//! A post's `locked_tags` string pins tags in (`tag`) or out (`-tag`) of
//! the tag list across later edits. The string is parsed once per edit
//! into a [`LockDirective`]; the removal side is expanded with every tag
//! that would re-imply a locked-out tag, otherwise implication expansion
//! would immediately undo the lock.

use crate::db::Database;
use crate::models::edit::Warnings;
use crate::models::tag::Category;
use crate::services::parser;
use crate::services::relations::{self, TagRelations};
use crate::utils::AppResult;

/// A parsed lock string: tags forced in and tags forced out.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LockDirective {
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

impl LockDirective {
    /// Parse a raw lock string. Names are lowercased and aliased;
    /// invalid-category tags are stripped with a warning; the remove
    /// side is widened to implying descendants.
    pub fn parse(
        db: &Database,
        tag_relations: &dyn TagRelations,
        locked_string: &str,
        warnings: &mut Warnings,
    ) -> AppResult<LockDirective> {
        let mut add: Vec<String> = Vec::new();
        let mut remove: Vec<String> = Vec::new();

        for token in parser::scan(&locked_string.to_lowercase()) {
            match token.strip_prefix('-') {
                Some(name) if !name.is_empty() => {
                    remove.push(relations::to_aliased(tag_relations, name));
                }
                Some(_) => {}
                None => add.push(relations::to_aliased(tag_relations, &token)),
            }
        }

        let mut all: Vec<String> = add.clone();
        all.extend(remove.iter().cloned());
        let categories = db.categories_for(&all)?;
        let invalid: Vec<String> = all
            .into_iter()
            .filter(|name| categories.get(name) == Some(&Category::Invalid))
            .collect();
        if !invalid.is_empty() {
            warnings.add(format!(
                "Removed {} invalid locked tag(s): {}",
                invalid.len(),
                invalid.join(", ")
            ));
            add.retain(|name| !invalid.contains(name));
            remove.retain(|name| !invalid.contains(name));
        }

        let descendants = relations::implying_descendants(tag_relations, &remove);
        for name in descendants {
            if !remove.contains(&name) {
                remove.push(name);
            }
        }

        add = parser::dedup(add);
        remove = parser::dedup(remove);
        Ok(LockDirective { add, remove })
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }

    /// Tags forced in whether or not the editor asked for them.
    pub fn contains(&self, name: &str) -> bool {
        self.add.iter().any(|t| t == name) || self.remove.iter().any(|t| t == name)
    }

    /// Enforce the directive on a tag list. Warns only when membership
    /// actually changes, so a no-op lock stays silent.
    pub fn apply(&self, tags: Vec<String>, warnings: &mut Warnings) -> Vec<String> {
        let forced_in: Vec<String> = self
            .add
            .iter()
            .filter(|name| !tags.contains(name))
            .cloned()
            .collect();
        let forced_out: Vec<String> = self
            .remove
            .iter()
            .filter(|name| tags.contains(name))
            .cloned()
            .collect();

        if !forced_in.is_empty() {
            warnings.add(format!(
                "Forcefully added {} locked tag(s): {}",
                forced_in.len(),
                forced_in.join(", ")
            ));
        }
        if !forced_out.is_empty() {
            warnings.add(format!(
                "Forcefully removed {} locked tag(s): {}",
                forced_out.len(),
                forced_out.join(", ")
            ));
        }

        let mut out: Vec<String> = tags
            .into_iter()
            .filter(|name| !self.remove.contains(name))
            .collect();
        out.extend(forced_in);
        out
    }

    /// Canonical string form: forced-in names, then `-`-prefixed
    /// forced-out names, each side sorted. Empty directives render as
    /// `None` so the column stays NULL rather than an empty string.
    pub fn to_locked_string(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let mut add = self.add.clone();
        add.sort();
        let mut remove = self.remove.clone();
        remove.sort();
        let mut parts = add;
        parts.extend(remove.into_iter().map(|name| format!("-{}", name)));
        Some(parts.join(" "))
    }
}
