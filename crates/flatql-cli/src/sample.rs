use flatql_core::schema::{FetchError, SampleFetcher, SourceKey};
use std::{
    fs,
    path::{Path, PathBuf},
};

///
/// NdjsonFetcher
///
/// Samples a newline-delimited JSON file. The file is re-read on every fetch
/// so a retry sees the latest contents. Blank and `null` lines are skipped,
/// mirroring a non-null column filter.
///

pub(crate) struct NdjsonFetcher {
    path: PathBuf,
}

impl NdjsonFetcher {
    pub(crate) fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl SampleFetcher for NdjsonFetcher {
    fn fetch(&self, key: &SourceKey, limit: usize) -> Result<Vec<String>, FetchError> {
        let text = fs::read_to_string(&self.path)
            .map_err(|err| FetchError::new(format!("{}: {err}", self.path.display())))?;

        let rows: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && *line != "null")
            .take(limit)
            .map(ToString::to_string)
            .collect();
        tracing::debug!(%key, rows = rows.len(), path = %self.path.display(), "sampled rows");

        Ok(rows)
    }
}
