use crate::{
    config::GeneratorConfig,
    obs::sink::{MetricsEvent, record},
    schema::{Schema, SchemaCache, path},
};
use derive_more::Display;
use serde_json::Value;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use thiserror::Error as ThisError;

///
/// SourceKey
///
/// Cache identity for one semi-structured column of one source.
///

#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("{source}.{column}")]
pub struct SourceKey {
    pub source: String,
    pub column: String,
}

impl SourceKey {
    pub fn new(source: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            column: column.into(),
        }
    }
}

///
/// FetchError
/// Failure reported by a sampler for one attempt.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

///
/// SampleFetcher
///
/// External collaborator returning up to `limit` raw, non-null documents
/// from the column named by `key`. Order is unspecified.
///

pub trait SampleFetcher {
    fn fetch(&self, key: &SourceKey, limit: usize) -> Result<Vec<String>, FetchError>;
}

impl<F> SampleFetcher for F
where
    F: Fn(&SourceKey, usize) -> Result<Vec<String>, FetchError>,
{
    fn fetch(&self, key: &SourceKey, limit: usize) -> Result<Vec<String>, FetchError> {
        self(key, limit)
    }
}

///
/// InferError
///

#[derive(Debug, ThisError)]
pub enum InferError {
    #[error("error accessing {key} after {attempts} attempts: {last}")]
    DataFetch {
        key: String,
        attempts: u32,
        last: FetchError,
    },

    #[error("no data found in {key}")]
    NoData { key: String },

    #[error("no valid JSON documents among {rows} sampled rows of {key}")]
    NoValidDocuments { key: String, rows: usize },
}

///
/// SchemaInferencer
///
/// Cache-fronted schema inference for one configuration.
///

pub struct SchemaInferencer<'a> {
    cache: &'a SchemaCache,
    ttl: Duration,
    max_sample_size: usize,
    max_depth: usize,
    fetch_attempts: u32,
}

impl<'a> SchemaInferencer<'a> {
    #[must_use]
    pub fn new(cache: &'a SchemaCache, config: &GeneratorConfig) -> Self {
        Self {
            cache,
            ttl: config.cache_ttl(),
            max_sample_size: config.max_sample_size,
            max_depth: config.max_depth,
            fetch_attempts: config.fetch_attempts.max(1),
        }
    }

    /// Return the schema for `key`, sampling through `fetcher` on a cache miss.
    ///
    /// Only a successful inference is cached. Two concurrent misses for the
    /// same key both sample; whichever inserts last wins.
    pub fn infer(
        &self,
        key: &SourceKey,
        fetcher: &dyn SampleFetcher,
    ) -> Result<Arc<Schema>, InferError> {
        if let Some(schema) = self.cache.get(key, self.ttl, Instant::now()) {
            tracing::debug!(%key, paths = schema.len(), "schema cache hit");
            return Ok(schema);
        }
        tracing::debug!(%key, "schema cache miss");

        let rows = self.fetch_with_retry(key, fetcher)?;
        if rows.is_empty() {
            return Err(InferError::NoData {
                key: key.to_string(),
            });
        }

        let schema = Arc::new(self.build(key, &rows)?);
        self.cache.insert(key.clone(), Arc::clone(&schema), Instant::now());

        Ok(schema)
    }

    fn fetch_with_retry(
        &self,
        key: &SourceKey,
        fetcher: &dyn SampleFetcher,
    ) -> Result<Vec<String>, InferError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            record(MetricsEvent::FetchAttempt);

            match fetcher.fetch(key, self.max_sample_size) {
                Ok(rows) => return Ok(rows),
                Err(err) => {
                    record(MetricsEvent::FetchFailed);
                    if attempt >= self.fetch_attempts {
                        return Err(InferError::DataFetch {
                            key: key.to_string(),
                            attempts: attempt,
                            last: err,
                        });
                    }
                    tracing::warn!(%key, attempt, error = %err, "sample fetch failed, retrying");
                }
            }
        }
    }

    fn build(&self, key: &SourceKey, rows: &[String]) -> Result<Schema, InferError> {
        let walker = Walker {
            max_depth: self.max_depth,
        };
        let mut schema = Schema::new();
        let mut parsed = 0usize;

        for row in rows {
            match serde_json::from_str::<Value>(row) {
                Ok(document) => {
                    walker.walk_document(&mut schema, &document);
                    parsed += 1;
                }
                Err(err) => {
                    record(MetricsEvent::DocumentSkipped);
                    tracing::warn!(%key, error = %err, "skipping malformed sample row");
                }
            }
        }

        if parsed == 0 {
            return Err(InferError::NoValidDocuments {
                key: key.to_string(),
                rows: rows.len(),
            });
        }
        record(MetricsEvent::DocumentsSampled {
            count: parsed as u64,
        });

        Ok(schema)
    }
}

/// Infer the schema of a single parsed document.
#[must_use]
pub fn infer_document(document: &Value, max_depth: usize) -> Schema {
    let mut schema = Schema::new();
    Walker { max_depth }.walk_document(&mut schema, document);

    schema
}

///
/// Walker
///
/// Recursive document walk. Each step receives the enclosing array hierarchy
/// by shared slice and copies it before extending, so sibling branches never
/// observe each other's arrays.
///

struct Walker {
    max_depth: usize,
}

impl Walker {
    fn walk_document(&self, schema: &mut Schema, document: &Value) {
        self.walk(schema, document, "", &[]);
    }

    fn walk(&self, schema: &mut Schema, node: &Value, at: &str, hierarchy: &[String]) {
        match node {
            Value::Object(map) => {
                for (key, value) in map {
                    let child = path::join(at, key);
                    if path::depth(&child) > self.max_depth {
                        continue;
                    }

                    schema.observe(&child, value, hierarchy, at);
                    self.walk(schema, value, &child, hierarchy);
                }
            }

            // Only the first element is walked; it stands in for the rest.
            // Arrays directly inside arrays are not descended.
            Value::Array(items) => {
                let Some(first @ Value::Object(_)) = items.first() else {
                    return;
                };

                let mut nested = hierarchy.to_vec();
                nested.push(at.to_string());
                self.walk(schema, first, at, &nested);
            }

            _ => {}
        }
    }
}
