//! Module: resolve
//! Responsibility: map a requested field name onto schema paths.
//! Does not own: alias assignment or clause grouping for ties (see `compile`).

use crate::schema::{JsonKind, Schema, path};
use thiserror::Error as ThisError;

///
/// ResolveError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ResolveError {
    #[error("Field '{field}' not found in JSON structure")]
    FieldNotFound { field: String },
}

///
/// ResolvedPath
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedPath {
    pub path: String,
    pub array_hierarchy: Vec<String>,
    pub kind: JsonKind,
}

///
/// ResolvedField
///
/// Candidates that survived disambiguation, in path order. More than one
/// candidate means the tie could not be broken.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedField {
    pub field: String,
    pub candidates: Vec<ResolvedPath>,
}

impl ResolvedField {
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.candidates.len() > 1
    }

    /// Every array path any candidate needs expanded.
    pub fn array_paths(&self) -> impl Iterator<Item = &str> {
        self.candidates
            .iter()
            .flat_map(|candidate| candidate.array_hierarchy.iter().map(String::as_str))
    }
}

/// Resolve `field` against `schema`.
///
/// A bare name matches any path whose final segment equals it; a dotted name
/// matches on trailing segment boundaries. When several paths match, only the
/// shallowest survive, then only those under the fewest arrays.
pub fn resolve(schema: &Schema, field: &str) -> Result<ResolvedField, ResolveError> {
    let mut candidates: Vec<(usize, ResolvedPath)> = schema
        .iter()
        .filter(|(p, _)| path::ends_with_segments(p, field))
        .map(|(p, entry)| {
            (
                entry.depth,
                ResolvedPath {
                    path: p.to_string(),
                    array_hierarchy: entry.array_hierarchy.clone(),
                    kind: entry.kind,
                },
            )
        })
        .collect();

    if candidates.is_empty() {
        return Err(ResolveError::FieldNotFound {
            field: field.to_string(),
        });
    }

    if candidates.len() > 1 {
        if let Some(min_depth) = candidates.iter().map(|(depth, _)| *depth).min() {
            candidates.retain(|(depth, _)| *depth == min_depth);
        }
        if let Some(min_arrays) = candidates
            .iter()
            .map(|(_, c)| c.array_hierarchy.len())
            .min()
        {
            candidates.retain(|(_, c)| c.array_hierarchy.len() == min_arrays);
        }
    }

    Ok(ResolvedField {
        field: field.to_string(),
        candidates: candidates.into_iter().map(|(_, c)| c).collect(),
    })
}
