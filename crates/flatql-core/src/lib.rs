//! Core runtime for FlatQL: schema inference over sampled JSON documents,
//! the condition mini-language, field resolution, lateral-flatten planning,
//! and query compilation.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod compile;
pub mod condition;
pub mod config;
pub mod error;
pub mod flatten;
pub mod generate;
pub mod obs;
pub mod resolve;
pub mod sanitize;
pub mod schema;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Default time-to-live for cached schemas, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3_600;

/// Default number of documents requested from the sampler.
pub const DEFAULT_MAX_SAMPLE_SIZE: usize = 100;

/// Default nesting limit for schema traversal.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Default number of fetch attempts before a sample failure is surfaced.
pub const DEFAULT_FETCH_ATTEMPTS: u32 = 3;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No caches, sinks, or stage internals are re-exported here.
///

pub mod prelude {
    pub use crate::{
        condition::{CompareOp, Condition, ConditionValue, LogicOp},
        config::GeneratorConfig,
        error::{Error, ErrorKind, ErrorOrigin},
        generate::{Generator, generate, try_generate},
        schema::{FetchError, JsonKind, SampleFetcher, Schema, SchemaEntry, SourceKey},
    };
}
