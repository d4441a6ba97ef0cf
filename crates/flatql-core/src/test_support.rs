//! Shared fixtures for unit tests.

use crate::{
    DEFAULT_MAX_DEPTH,
    schema::{FetchError, Schema, SourceKey, infer_document},
};
use serde_json::Value;
use std::cell::Cell;

/// Build one schema from several sampled documents.
pub(crate) fn schema_of(documents: &[Value]) -> Schema {
    let mut schema = Schema::new();
    for document in documents {
        for (path, entry) in &infer_document(document, DEFAULT_MAX_DEPTH) {
            schema.insert_entry(path.clone(), entry.clone());
        }
    }

    schema
}

///
/// ScriptedFetcher
///
/// Returns `rows` after failing the first `failures` calls; counts every call.
///

pub(crate) struct ScriptedFetcher {
    pub(crate) rows: Vec<String>,
    pub(crate) failures: u32,
    pub(crate) calls: Cell<u32>,
}

impl ScriptedFetcher {
    pub(crate) fn rows(rows: &[Value]) -> Self {
        Self::raw(rows.iter().map(Value::to_string).collect())
    }

    pub(crate) fn raw(rows: Vec<String>) -> Self {
        Self {
            rows,
            failures: 0,
            calls: Cell::new(0),
        }
    }

    pub(crate) fn failing(failures: u32, rows: &[Value]) -> Self {
        Self {
            failures,
            ..Self::rows(rows)
        }
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl crate::schema::SampleFetcher for ScriptedFetcher {
    fn fetch(&self, _key: &SourceKey, limit: usize) -> Result<Vec<String>, FetchError> {
        let call = self.calls.get() + 1;
        self.calls.set(call);

        if call <= self.failures {
            return Err(FetchError::new(format!("warehouse unavailable (call {call})")));
        }

        Ok(self.rows.iter().take(limit).cloned().collect())
    }
}
