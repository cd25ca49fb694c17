//! Run configuration.
//!
//! Settings come from an optional TOML file and are overridden by
//! command-line flags. Without either, paths resolve under `data/` in the
//! current directory.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::CliError;

/// Config file picked up from the working directory when `--config` is not
/// given.
pub const DEFAULT_CONFIG_FILE: &str = "propscrape.toml";

const DEFAULT_INPUT_DIR: &str = "data/raw_html";
const DEFAULT_OUTPUT_DIR: &str = "data/processed";
const DEFAULT_TEST_RUN_LIMIT: usize = 5;

const FINAL_OUTPUT_FILE: &str = "propiedades_procesado_FINAL.csv";
const TEST_RUN_OUTPUT_FILE: &str = "propiedades_procesado_PRUEBA.csv";

/// Contents of a `propscrape.toml` file. Every key is optional.
///
/// ```toml
/// input_dir = "data/raw_html"
/// output_dir = "data/processed"
/// jobs = 4
/// test_run_limit = 5
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Directory holding the saved `.html` listing pages.
    pub input_dir: Option<PathBuf>,
    /// Directory the CSV is written to.
    pub output_dir: Option<PathBuf>,
    /// Maximum number of pages parsed concurrently.
    pub jobs: Option<usize>,
    /// Number of files processed in test-run mode.
    pub test_run_limit: Option<usize>,
}

impl RunConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the text is malformed or has unknown keys.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Loads the config at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::ConfigRead`] or [`CliError::ConfigParse`].
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| CliError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `explicit` if given, otherwise [`DEFAULT_CONFIG_FILE`] when it
    /// exists, otherwise an empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen file cannot be read or parsed.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, CliError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            log::debug!("Using config file {}", default_path.display());
            return Self::load(default_path);
        }
        Ok(Self::default())
    }
}

/// Command-line overrides applied on top of a [`RunConfig`].
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub input_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub limit: Option<usize>,
    pub test_run: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub jobs: usize,
    /// Maximum number of files to process, if any.
    pub limit: Option<usize>,
    pub test_run: bool,
}

impl Settings {
    /// Merges `config` with `overrides`, flags taking precedence.
    ///
    /// In test-run mode the file limit defaults to the configured
    /// `test_run_limit` (5 if unset).
    #[must_use]
    pub fn resolve(config: RunConfig, overrides: Overrides) -> Self {
        let limit = overrides.limit.or_else(|| {
            overrides
                .test_run
                .then(|| config.test_run_limit.unwrap_or(DEFAULT_TEST_RUN_LIMIT))
        });
        let jobs = overrides
            .jobs
            .or(config.jobs)
            .unwrap_or_else(default_jobs)
            .max(1);

        Self {
            input_dir: overrides
                .input_dir
                .or(config.input_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT_DIR)),
            output_dir: overrides
                .output_dir
                .or(config.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            jobs,
            limit,
            test_run: overrides.test_run,
        }
    }

    /// Path of the CSV this run writes.
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        let name = if self.test_run {
            TEST_RUN_OUTPUT_FILE
        } else {
            FINAL_OUTPUT_FILE
        };
        self.output_dir.join(name)
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_config() {
        let config = RunConfig::parse("input_dir = \"pages\"\njobs = 2\n").unwrap();
        assert_eq!(config.input_dir, Some(PathBuf::from("pages")));
        assert_eq!(config.jobs, Some(2));
        assert_eq!(config.output_dir, None);
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(RunConfig::parse("inputdir = \"pages\"").is_err());
    }

    #[test]
    fn defaults_without_config_or_flags() {
        let settings = Settings::resolve(RunConfig::default(), Overrides::default());
        assert_eq!(settings.input_dir, PathBuf::from(DEFAULT_INPUT_DIR));
        assert_eq!(settings.limit, None);
        assert!(settings.jobs >= 1);
        assert_eq!(
            settings.output_path(),
            Path::new(DEFAULT_OUTPUT_DIR).join(FINAL_OUTPUT_FILE)
        );
    }

    #[test]
    fn flags_override_config() {
        let config = RunConfig {
            input_dir: Some(PathBuf::from("from_config")),
            output_dir: Some(PathBuf::from("out")),
            jobs: Some(8),
            test_run_limit: None,
        };
        let overrides = Overrides {
            input_dir: Some(PathBuf::from("from_flag")),
            jobs: Some(0),
            ..Overrides::default()
        };
        let settings = Settings::resolve(config, overrides);
        assert_eq!(settings.input_dir, PathBuf::from("from_flag"));
        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert_eq!(settings.jobs, 1);
    }

    #[test]
    fn test_run_limits_files_and_renames_output() {
        let overrides = Overrides {
            test_run: true,
            ..Overrides::default()
        };
        let settings = Settings::resolve(RunConfig::default(), overrides);
        assert_eq!(settings.limit, Some(DEFAULT_TEST_RUN_LIMIT));
        assert!(settings.output_path().ends_with(TEST_RUN_OUTPUT_FILE));

        let config = RunConfig {
            test_run_limit: Some(2),
            ..RunConfig::default()
        };
        let overrides = Overrides {
            test_run: true,
            limit: Some(10),
            ..Overrides::default()
        };
        assert_eq!(Settings::resolve(config, overrides).limit, Some(10));
    }
}
