//! Configuration management for Dossier.
//!
//! Loads configuration from ${DOSSIER_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::source::DataSource;

/// Returns the default config template with comments.
///
/// Embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for Dossier configuration and log directories.
    //!
    //! DOSSIER_HOME resolution order:
    //! 1. DOSSIER_HOME environment variable (if set)
    //! 2. ~/.config/dossier (default)

    use std::path::PathBuf;

    /// Returns the Dossier home directory.
    ///
    /// Falls back to `.dossier` in the working directory when no home
    /// directory can be determined.
    pub fn dossier_home() -> PathBuf {
        if let Ok(home) = std::env::var("DOSSIER_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".dossier"),
            |h| h.join(".config").join("dossier"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        dossier_home().join("config.toml")
    }

    /// Returns the directory for TUI log files.
    pub fn logs_dir() -> PathBuf {
        dossier_home().join("logs")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `<collection>.json` files
    pub data_dir: Option<String>,

    /// Base URL serving `<collection>.json` (wins over `data_dir`)
    pub data_url: Option<String>,

    /// Per-collection fetch timeout in seconds (0 disables)
    pub fetch_timeout_secs: u32,

    /// Initial "show all" state of skill panels
    pub show_all_skills: bool,

    /// Log filter used when DOSSIER_LOG is unset
    pub log_level: String,
}

impl Config {
    const DEFAULT_DATA_DIR: &str = "data";
    const DEFAULT_FETCH_TIMEOUT_SECS: u32 = 30;
    const DEFAULT_LOG_LEVEL: &str = "warn";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }

    /// Returns the fetch timeout, or None if disabled (0).
    pub fn fetch_timeout(&self) -> Option<Duration> {
        if self.fetch_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.fetch_timeout_secs)))
        }
    }

    /// Builds the data source, honouring a command-line override.
    ///
    /// Precedence: `override_location`, then `data_url`, then `data_dir`.
    ///
    /// # Errors
    /// Returns an error if a URL does not parse.
    pub fn data_source(&self, override_location: Option<&str>) -> Result<DataSource> {
        let location = override_location
            .or(self.data_url.as_deref())
            .or(self.data_dir.as_deref())
            .unwrap_or(Self::DEFAULT_DATA_DIR);
        let source = DataSource::parse(location)
            .with_context(|| format!("Invalid data location '{location}'"))?;
        Ok(source.with_timeout(self.fetch_timeout()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: Some(Self::DEFAULT_DATA_DIR.to_string()),
            data_url: None,
            fetch_timeout_secs: Self::DEFAULT_FETCH_TIMEOUT_SECS,
            show_all_skills: false,
            log_level: Self::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tempfile::tempdir;
    use url::Url;

    use super::*;
    use crate::source::Location;

    /// Config loading: missing file returns defaults.
    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.fetch_timeout(), Some(Duration::from_secs(30)));
    }

    /// Config loading: partial config merges with defaults.
    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "show_all_skills = true\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert!(config.show_all_skills);
        assert_eq!(config.data_dir.as_deref(), Some("data"));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_load_invalid_toml_names_path() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "fetch_timeout_secs = \"soon\"\n").unwrap();

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    /// Config init: writes the template and creates parent dirs.
    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("data_dir = \"data\""));
        assert!(contents.contains("# data_url ="));
        assert_eq!(Config::load_from(&config_path).unwrap(), Config::default());
    }

    /// Config init: fails if file exists (no silent overwrite).
    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "").unwrap();

        assert!(Config::init(&config_path).is_err());
    }

    #[test]
    fn test_fetch_timeout_zero_disables() {
        let config = Config {
            fetch_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.fetch_timeout(), None);
    }

    #[test]
    fn test_data_source_precedence() {
        let config = Config {
            data_dir: Some("local".to_string()),
            data_url: Some("https://example.com/data".to_string()),
            ..Default::default()
        };

        let source = config.data_source(None).unwrap();
        assert_eq!(
            source.location(),
            &Location::Http(Url::parse("https://example.com/data/").unwrap())
        );

        let source = config.data_source(Some("fixtures")).unwrap();
        assert_eq!(
            source.location(),
            &Location::Directory(PathBuf::from("fixtures"))
        );
    }

    #[test]
    fn test_invalid_url_is_error() {
        let config = Config::default();
        assert!(config.data_source(Some("http://")).is_err());
    }
}
