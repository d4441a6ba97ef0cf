use crate::CliError;
use clap::Args;
use flatql_core::config::GeneratorConfig;
use std::{fs, path::PathBuf};

///
/// ConfigArgs
///
/// Generator tunables. A JSON config file supplies the base; explicit flags
/// and their environment variables override it field by field.
///

#[derive(Args, Debug, Default)]
pub(crate) struct ConfigArgs {
    /// JSON file with any subset of the generator settings.
    #[arg(long = "config", env = "FLATQL_CONFIG")]
    pub(crate) file: Option<PathBuf>,

    /// Schema cache time-to-live, in seconds.
    #[arg(long, env = "FLATQL_CACHE_TTL_SECS")]
    pub(crate) cache_ttl_secs: Option<u64>,

    /// Documents requested per sample.
    #[arg(long, env = "FLATQL_MAX_SAMPLE_SIZE")]
    pub(crate) max_sample_size: Option<usize>,

    /// Deepest path recorded during inference.
    #[arg(long, env = "FLATQL_MAX_DEPTH")]
    pub(crate) max_depth: Option<usize>,

    /// Sampler attempts before giving up.
    #[arg(long, env = "FLATQL_FETCH_ATTEMPTS")]
    pub(crate) fetch_attempts: Option<u32>,
}

impl ConfigArgs {
    pub(crate) fn resolve(&self) -> Result<GeneratorConfig, CliError> {
        let mut config = match &self.file {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| CliError::Io {
                    path: path.clone(),
                    source,
                })?;
                GeneratorConfig::from_json(&text).map_err(|source| CliError::Config {
                    path: path.clone(),
                    source,
                })?
            }
            None => GeneratorConfig::default(),
        };

        if let Some(ttl) = self.cache_ttl_secs {
            config.cache_ttl_secs = ttl;
        }
        if let Some(size) = self.max_sample_size {
            config.max_sample_size = size;
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if let Some(attempts) = self.fetch_attempts {
            config.fetch_attempts = attempts;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, process};

    #[test]
    fn flags_override_defaults() {
        let args = ConfigArgs {
            max_depth: Some(3),
            fetch_attempts: Some(1),
            ..ConfigArgs::default()
        };

        let config = args.resolve().unwrap();

        assert_eq!(config.max_depth, 3);
        assert_eq!(config.fetch_attempts, 1);
        assert_eq!(config.max_sample_size, GeneratorConfig::default().max_sample_size);
    }

    #[test]
    fn flags_override_the_config_file() {
        let path = env::temp_dir().join(format!("flatql-settings-{}.json", process::id()));
        fs::write(&path, r#"{ "max_depth": 2, "max_sample_size": 7 }"#).unwrap();

        let args = ConfigArgs {
            file: Some(path.clone()),
            max_depth: Some(5),
            ..ConfigArgs::default()
        };
        let config = args.resolve().unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.max_depth, 5);
        assert_eq!(config.max_sample_size, 7);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let args = ConfigArgs {
            file: Some(PathBuf::from("/nonexistent/flatql.json")),
            ..ConfigArgs::default()
        };

        assert!(matches!(args.resolve(), Err(CliError::Io { .. })));
    }
}
