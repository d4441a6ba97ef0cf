//! Module: flatten
//! Responsibility: order and alias the array paths a query must expand.
//! Does not own: deciding which arrays are needed (see `resolve`).

use crate::{sanitize::escape_literal, schema::path};
use derive_more::Deref;
use std::collections::BTreeSet;

const ALIAS_PREFIX: &str = "f";

///
/// FlattenEntry
///
/// One lateral expansion. `input_path` is relative to `parent_alias` when
/// there is one, otherwise relative to the root column. The empty path stands
/// for an array at the document root.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlattenEntry {
    pub path: String,
    pub alias: String,
    pub parent_alias: Option<String>,
    pub input_path: String,
}

impl FlattenEntry {
    /// Render this entry as a lateral-expansion clause over `column`.
    #[must_use]
    pub fn render(&self, column: &str) -> String {
        let input = match (&self.parent_alias, self.input_path.is_empty()) {
            (Some(parent), _) => format!("{parent}.value:{}", escape_literal(&self.input_path)),
            (None, true) => column.to_string(),
            (None, false) => format!("{column}:{}", escape_literal(&self.input_path)),
        };

        format!(", LATERAL FLATTEN(input => {input}) {}", self.alias)
    }
}

///
/// FlattenPlan
///
/// Expansions in declaration order. An entry only ever references the alias
/// of an entry before it.
///

#[derive(Clone, Debug, Default, Deref, Eq, PartialEq)]
pub struct FlattenPlan(Vec<FlattenEntry>);

impl FlattenPlan {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Alias assigned to `path`, if it is part of the plan.
    #[must_use]
    pub fn alias_of(&self, path: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|entry| entry.path == path)
            .map(|entry| entry.alias.as_str())
    }
}

/// Plan the expansions for a set of array paths.
///
/// Paths are deduplicated and processed shallowest first, ties broken by path,
/// so a parent array is always aliased before anything nested in it.
pub fn plan<'a>(array_paths: impl IntoIterator<Item = &'a str>) -> FlattenPlan {
    let mut ordered: Vec<&str> = array_paths
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    ordered.sort_by(|a, b| path::depth(a).cmp(&path::depth(b)).then_with(|| a.cmp(b)));

    let mut entries: Vec<FlattenEntry> = Vec::with_capacity(ordered.len());
    for array_path in ordered {
        // Nearest processed ancestor: the longest one it sits under.
        let parent = entries
            .iter()
            .filter(|entry| path::is_descendant(array_path, &entry.path))
            .max_by_key(|entry| entry.path.len());

        let (parent_alias, input_path) = match parent {
            Some(parent) => (
                Some(parent.alias.clone()),
                path::relative_to(array_path, &parent.path)
                    .unwrap_or(array_path)
                    .to_string(),
            ),
            None => (None, array_path.to_string()),
        };

        let alias = format!("{ALIAS_PREFIX}{}", entries.len() + 1);
        entries.push(FlattenEntry {
            path: array_path.to_string(),
            alias,
            parent_alias,
            input_path,
        });
    }

    FlattenPlan(entries)
}
