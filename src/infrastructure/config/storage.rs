use super::app_config::AppConfig;
use directories::ProjectDirs;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "linuxmobile";
const APP_NAME: &str = "mosaicord";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors from loading or writing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform did not yield a home directory to anchor paths in.
    #[error("failed to determine application directories")]
    DirsNotFound,
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The default config could not be rendered to TOML.
    #[error("toml serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

/// Resolves where mosaicord keeps its files.
///
/// The config directory holds `config.toml`; the data directory is the
/// default home for canvases, history logs, and the token file unless the
/// config overrides it.
pub struct StorageManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl StorageManager {
    /// Resolves the platform directories for the application.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DirsNotFound`] when no home directory exists
    /// to derive them from.
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .ok_or(ConfigError::DirsNotFound)?;

        Ok(Self {
            config_dir: dirs.config_dir().to_path_buf(),
            data_dir: dirs.data_dir().to_path_buf(),
        })
    }

    /// Builds a manager rooted at explicit directories. Used in tests.
    #[must_use]
    pub const fn with_dirs(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            config_dir,
            data_dir,
        }
    }

    /// Default directory for canvases, history logs, and the token file.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Loads the configuration, writing a default file on first run.
    ///
    /// A file that exists but does not parse is left untouched and the
    /// defaults are used for this run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file or its directory cannot be
    /// read or created.
    pub fn load_config(&self, path_override: Option<&Path>) -> Result<AppConfig, ConfigError> {
        let config_path = path_override
            .map_or_else(|| self.config_dir.join(CONFIG_FILE_NAME), Path::to_path_buf);

        if !config_path.exists() {
            info!(path = %config_path.display(), "No config file, writing defaults");
            let defaults = AppConfig::default();
            Self::write_default(&config_path, &defaults)?;
            return Ok(defaults);
        }

        let content = fs::read_to_string(&config_path)?;
        match toml::from_str::<AppConfig>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "Config file does not parse, using defaults");
                Ok(AppConfig::default())
            }
        }
    }

    fn write_default(path: &Path, defaults: &AppConfig) -> Result<(), ConfigError> {
        let parent = path
            .parent()
            .ok_or_else(|| std::io::Error::other("config path has no parent"))?;
        fs::create_dir_all(parent)?;

        let content = toml::to_string_pretty(defaults)?;
        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.persist(path).map_err(|e| e.error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn manager_in(dir: &Path) -> StorageManager {
        StorageManager::with_dirs(dir.join("config"), dir.join("data"))
    }

    #[test]
    fn test_first_run_writes_default_config() {
        let dir = tempdir().unwrap();
        let manager = manager_in(dir.path());

        let config = manager.load_config(None).unwrap();
        assert_eq!(config.canvas.width, 1920);

        let written = fs::read_to_string(dir.path().join("config/config.toml")).unwrap();
        assert!(written.contains("[canvas]"));
        assert!(written.contains("[queue]"));
    }

    #[test]
    fn test_malformed_config_is_kept_and_defaults_used() {
        let dir = tempdir().unwrap();
        let manager = manager_in(dir.path());
        let config_file = dir.path().join("config");
        fs::create_dir_all(&config_file).unwrap();
        let config_file = config_file.join(CONFIG_FILE_NAME);

        fs::write(&config_file, "invalid_toml = [").unwrap();

        let config = manager.load_config(None).unwrap();
        assert_eq!(config.queue.capacity, 32);

        // The broken file is not clobbered by the defaults.
        let content = fs::read_to_string(&config_file).unwrap();
        assert_eq!(content, "invalid_toml = [");
    }

    #[test]
    fn test_path_override_wins() {
        let dir = tempdir().unwrap();
        let manager = manager_in(dir.path());
        let custom_path = dir.path().join("custom.toml");

        fs::write(&custom_path, "[canvas]\nwidth = 640\nheight = 480\n").unwrap();

        let config = manager.load_config(Some(&custom_path)).unwrap();
        assert_eq!(config.canvas.width, 640);
        assert_eq!(config.canvas.height, 480);

        // Nothing was written to the manager's own config dir.
        assert!(!dir.path().join("config").exists());
    }

    #[test]
    fn test_data_dir_is_separate_from_config_dir() {
        let dir = tempdir().unwrap();
        let manager = manager_in(dir.path());

        assert_eq!(manager.data_dir(), dir.path().join("data"));
        assert_ne!(manager.data_dir(), dir.path().join("config"));
    }
}
