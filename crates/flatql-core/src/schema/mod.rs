//! Module: schema
//! Responsibility: path-indexed schema built from sampled documents, its
//! inference walk, and the process-wide schema cache.
//! Does not own: fetching documents (see `SampleFetcher`) or query emission.

mod cache;
mod infer;
mod kind;
pub mod path;


pub use cache::{CacheStats, SchemaCache};
pub use infer::{
    FetchError, InferError, SampleFetcher, SchemaInferencer, SourceKey, infer_document,
};
pub use kind::{JsonKind, TypeCategory};

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Longest rendered sample kept per entry, in characters.
const SAMPLE_VALUE_MAX_CHARS: usize = 100;

///
/// SchemaEntry
///
/// One observed path. `array_hierarchy` lists every enclosing array path from
/// the root outwards; the empty path stands for an array at the document root.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SchemaEntry {
    pub kind: JsonKind,
    pub array_hierarchy: Vec<String>,
    pub depth: usize,
    pub parent_path: String,
    pub contexts: BTreeSet<String>,
    pub sample_value: Option<String>,
}

impl SchemaEntry {
    fn new(path: &str, kind: JsonKind, hierarchy: &[String], parent: &str) -> Self {
        Self {
            kind,
            array_hierarchy: hierarchy.to_vec(),
            depth: path::depth(path),
            parent_path: parent.to_string(),
            contexts: BTreeSet::from([parent.to_string()]),
            sample_value: None,
        }
    }

    /// Nearest enclosing array path, if any.
    #[must_use]
    pub fn nearest_array(&self) -> Option<&str> {
        self.array_hierarchy.last().map(String::as_str)
    }
}

///
/// Schema
///
/// Ordered path → entry map. Iteration order is path order, which keeps
/// resolution and rendering deterministic.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Schema {
    entries: BTreeMap<String, SchemaEntry>,
}

impl Schema {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&SchemaEntry> {
        self.entries.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaEntry)> {
        self.entries.iter().map(|(path, entry)| (path.as_str(), entry))
    }

    /// True when some sampled document was an array at its root; entries
    /// under it carry the empty path as their outermost array.
    #[must_use]
    pub fn has_root_array(&self) -> bool {
        self.entries
            .values()
            .any(|entry| entry.array_hierarchy.first().is_some_and(String::is_empty))
    }

    /// Record one observation of `path`, merging with any earlier one.
    ///
    /// Kinds merge per `JsonKind::merge`, contexts are unioned, and the first
    /// non-null sample is kept. The first observed array hierarchy is kept.
    pub fn observe(&mut self, path: &str, value: &Value, hierarchy: &[String], parent: &str) {
        let kind = JsonKind::of(value);
        let entry = self
            .entries
            .entry(path.to_string())
            .or_insert_with(|| SchemaEntry::new(path, kind, hierarchy, parent));

        entry.kind = entry.kind.merge(kind);
        entry.contexts.insert(parent.to_string());
        if entry.sample_value.is_none() {
            entry.sample_value = render_sample(value);
        }
    }

    /// Insert a fully built entry, merging when the path already exists.
    pub fn insert_entry(&mut self, path: impl Into<String>, entry: SchemaEntry) {
        match self.entries.entry(path.into()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(entry);
            }
            std::collections::btree_map::Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                existing.kind = existing.kind.merge(entry.kind);
                existing.contexts.extend(entry.contexts);
                if existing.sample_value.is_none() {
                    existing.sample_value = entry.sample_value;
                }
            }
        }
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = (&'a String, &'a SchemaEntry);
    type IntoIter = std::collections::btree_map::Iter<'a, String, SchemaEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn render_sample(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Array(items) => format!("Array with {} items", items.len()),
        other => other.to_string(),
    };

    if text.chars().count() <= SAMPLE_VALUE_MAX_CHARS {
        Some(text)
    } else {
        let mut cut: String = text.chars().take(SAMPLE_VALUE_MAX_CHARS).collect();
        cut.push_str("...");
        Some(cut)
    }
}
