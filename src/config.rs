//! Global search configuration.
//!
//! Sources are merged in order, later ones winning:
//! 1. `SearchConfig::default()` for any key left unset
//! 2. a TOML file (explicit path, or the first default location that exists)
//! 3. environment variables prefixed `SEARCHABLE_MAPPER_SEARCH_`, e.g.
//!    `SEARCHABLE_MAPPER_SEARCH_ALWAYS_INHERIT_PROPERTIES=true`

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::Cli;

pub const CONFIG_ENV_PREFIX: &str = "SEARCHABLE_MAPPER_SEARCH_";
pub const CONFIG_PATH_ENV: &str = "SEARCHABLE_MAPPER_CONFIG";
pub const DEFAULT_CONFIG_FILENAME: &str = "searchable.toml";
pub const DEFAULT_CONFIG_DIR: &str = "searchable-mapper";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Properties never given a spec by `searchable = true`.
    #[serde(alias = "defaultExcludedProperties")]
    pub default_excluded_properties: Vec<String>,
    /// Keep inherited candidates when a block narrows with `only`.
    #[serde(alias = "alwaysInheritProperties")]
    pub always_inherit_properties: bool,
}

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn load(&self) -> Result<SearchConfig> {
        if let Some(path) = &self.config_path {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            debug!(path = %path.display(), "loading search config");
        }

        self.figment()
            .extract()
            .context("Failed to extract search configuration")
    }

    fn figment(&self) -> Figment {
        // Defaults come from `#[serde(default)]`; merging them as a provider
        // would clash with the camelCase aliases.
        let mut figment = Figment::new();
        if let Some(path) = &self.config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(&self.env_prefix))
    }
}

/// Explicit `--config`, then `$SEARCHABLE_MAPPER_CONFIG`, then the default
/// locations that exist.
pub fn resolve_config_path(cli: &Cli) -> Option<PathBuf> {
    if let Some(p) = cli.config.clone() {
        return Some(p);
    }

    if let Ok(p) = env::var(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(p));
    }

    default_config_candidates()
        .into_iter()
        .find(|path| path.exists())
}

pub fn load_config(cli: &Cli) -> Result<SearchConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = resolve_config_path(cli) {
        loader = loader.with_config_path(path);
    }
    loader.load()
}

fn default_config_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        candidates.push(cwd.join(DEFAULT_CONFIG_FILENAME));
    }
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILENAME));
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "searchable_mapper_test_{}_{}_{}",
            std::process::id(),
            nanos,
            name
        ))
    }

    fn isolated_loader() -> ConfigLoader {
        ConfigLoader::new().with_env_prefix("SEARCHABLE_MAPPER_UNIT_TEST_UNSET_")
    }

    #[test]
    fn defaults_apply_without_a_file() -> Result<()> {
        let config = isolated_loader().load()?;
        assert_eq!(config, SearchConfig::default());
        assert!(!config.always_inherit_properties);
        Ok(())
    }

    #[test]
    fn toml_file_accepts_snake_and_camel_case_keys() -> Result<()> {
        let snake = temp_path("snake.toml");
        std::fs::write(
            &snake,
            "default_excluded_properties = [\"password\", \"dateCreated\"]\nalways_inherit_properties = true\n",
        )?;
        let config = isolated_loader().with_config_path(&snake).load()?;
        assert_eq!(config.default_excluded_properties, vec!["password", "dateCreated"]);
        assert!(config.always_inherit_properties);

        let camel = temp_path("camel.toml");
        std::fs::write(&camel, "alwaysInheritProperties = true\n")?;
        let config = isolated_loader().with_config_path(&camel).load()?;
        assert!(config.always_inherit_properties);
        assert!(config.default_excluded_properties.is_empty());

        std::fs::remove_file(snake)?;
        std::fs::remove_file(camel)?;
        Ok(())
    }

    #[test]
    fn env_overrides_ignore_the_tool_variables() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SEARCHABLE_MAPPER_CONFIG", "elsewhere.toml");
            jail.set_env("SEARCHABLE_MAPPER_LOG", "debug");
            jail.set_env("SEARCHABLE_MAPPER_SEARCH_ALWAYS_INHERIT_PROPERTIES", "true");

            let figment = ConfigLoader::new().figment();
            assert!(figment.find_value("mapper_config").is_err());
            assert!(figment.find_value("config").is_err());
            assert!(figment.find_value("log").is_err());

            let config: SearchConfig = figment.extract()?;
            assert!(config.always_inherit_properties);
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = isolated_loader()
            .with_config_path(temp_path("missing.toml"))
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
