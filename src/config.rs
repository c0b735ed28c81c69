use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::actionable::Denylist;

pub const ENV_PREFIX: &str = "FOUNDER_LINKS";

/// Settings layered from `config.toml` in the platform config directory and
/// `FOUNDER_LINKS_*` environment variables (environment wins).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite file; defaults to the platform data directory.
    pub database: Option<PathBuf>,
    /// Appended to the built-in denylist.
    pub blocked_patterns: Vec<String>,
    pub log_results: bool,
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "founder-links")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path().as_deref())
    }

    /// A missing file is not an error.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_layered(path, environment())
    }

    fn load_layered(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        builder.add_source(env).build()?.try_deserialize()
    }

    pub fn denylist(&self) -> Denylist {
        Denylist::with_patterns(&self.blocked_patterns)
    }
}

/// `FOUNDER_LINKS_BLOCKED_PATTERNS` is comma-separated.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("blocked_patterns")
}
