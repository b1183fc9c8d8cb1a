//! Tag alias and implication resolution.

use std::collections::{HashMap, HashSet};

/// Source of alias and implication data.
///
/// Implementations must expose implications in both directions: the
/// consequents a tag pulls in, and the antecedents that pull a tag in.
pub trait TagRelations: Send + Sync {
    /// Follow the active alias for `name`, if any. One hop; alias chains
    /// are assumed collapsed at creation time.
    fn aliased(&self, name: &str) -> Option<String>;

    /// Tags directly implied by `name`.
    fn consequents(&self, name: &str) -> Vec<String>;

    /// Tags that directly imply `name`.
    fn antecedents(&self, name: &str) -> Vec<String>;
}

/// Resolve `name` through its alias, or return it unchanged.
pub fn to_aliased(relations: &dyn TagRelations, name: &str) -> String {
    relations
        .aliased(name)
        .unwrap_or_else(|| name.to_string())
}

/// Resolve every name through aliases, preserving order.
pub fn to_aliased_all(relations: &dyn TagRelations, names: &[String]) -> Vec<String> {
    names.iter().map(|n| to_aliased(relations, n)).collect()
}

/// The transitive closure of implied tags, excluding the inputs
/// themselves unless independently implied. Cycle-safe.
pub fn implied_ancestors(relations: &dyn TagRelations, names: &[String]) -> Vec<String> {
    walk(names, |n| relations.consequents(n))
}

/// The transitive closure of tags implying any of `names`. Used to
/// expand a forced removal so that re-implying descendants go with it.
pub fn implying_descendants(relations: &dyn TagRelations, names: &[String]) -> Vec<String> {
    walk(names, |n| relations.antecedents(n))
}

/// Input names plus everything they transitively imply.
pub fn with_implied(relations: &dyn TagRelations, names: &[String]) -> Vec<String> {
    let mut out = names.to_vec();
    let seen: HashSet<String> = names.iter().cloned().collect();
    for implied in implied_ancestors(relations, names) {
        if !seen.contains(&implied) {
            out.push(implied);
        }
    }
    out
}

fn walk<F>(names: &[String], step: F) -> Vec<String>
where
    F: Fn(&str) -> Vec<String>,
{
    let mut seen: HashSet<String> = names.iter().cloned().collect();
    let mut frontier: Vec<String> = names.to_vec();
    let mut out: Vec<String> = Vec::new();

    while let Some(name) = frontier.pop() {
        for next in step(&name) {
            if seen.insert(next.clone()) {
                out.push(next.clone());
                frontier.push(next);
            }
        }
    }

    out.sort();
    out
}

/// In-memory relation tables. Production embedders load these from
/// their alias/implication stores; tests build them directly.
#[derive(Debug, Default)]
pub struct InMemoryTagRelations {
    aliases: HashMap<String, String>,
    implications: HashMap<String, Vec<String>>,
    reverse: HashMap<String, Vec<String>>,
}

impl InMemoryTagRelations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_alias(&mut self, antecedent: &str, consequent: &str) {
        self.aliases
            .insert(antecedent.to_string(), consequent.to_string());
    }

    pub fn add_implication(&mut self, antecedent: &str, consequent: &str) {
        self.implications
            .entry(antecedent.to_string())
            .or_default()
            .push(consequent.to_string());
        self.reverse
            .entry(consequent.to_string())
            .or_default()
            .push(antecedent.to_string());
    }
}

impl TagRelations for InMemoryTagRelations {
    fn aliased(&self, name: &str) -> Option<String> {
        self.aliases.get(name).cloned()
    }

    fn consequents(&self, name: &str) -> Vec<String> {
        self.implications.get(name).cloned().unwrap_or_default()
    }

    fn antecedents(&self, name: &str) -> Vec<String> {
        self.reverse.get(name).cloned().unwrap_or_default()
    }
}
