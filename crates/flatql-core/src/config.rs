use crate::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_FETCH_ATTEMPTS, DEFAULT_MAX_DEPTH, DEFAULT_MAX_SAMPLE_SIZE,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

///
/// GeneratorConfig
///
/// Tunables for one generator invocation. Missing fields in a serialized
/// config fall back to the defaults.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Schema cache time-to-live, in seconds.
    pub cache_ttl_secs: u64,

    /// Documents requested from the sampler per attempt.
    pub max_sample_size: usize,

    /// Paths with more segments than this are not recorded.
    pub max_depth: usize,

    /// Total sampler attempts before giving up.
    pub fetch_attempts: u32,
}

impl GeneratorConfig {
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Parse a JSON config document.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_sample_size: DEFAULT_MAX_SAMPLE_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            fetch_attempts: DEFAULT_FETCH_ATTEMPTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults_for_missing_fields() {
        let config = GeneratorConfig::from_json(r#"{ "max_depth": 4 }"#).unwrap();

        assert_eq!(config.max_depth, 4);
        assert_eq!(config.cache_ttl(), Duration::from_secs(3_600));
        assert_eq!(config.fetch_attempts, 3);
        assert_eq!(config.max_sample_size, 100);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(GeneratorConfig::from_json(r#"{ "ttl": 5 }"#).is_err());
    }
}
