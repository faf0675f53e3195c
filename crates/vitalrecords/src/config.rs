//! Settings for the `vitrec` binary.
//!
//! Sources, lowest precedence first: built-in defaults, the TOML file, then
//! `VITALRECORDS_`-prefixed environment variables. Nested keys in the
//! environment are separated by a double underscore, so
//! `VITALRECORDS_VIEWS__SEARCH_LIMIT=3` sets `views.search_limit`.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::search::DEFAULT_SEARCH_LIMIT;
use crate::views::{DEFAULT_ACTIVITY_LIMIT, DEFAULT_NOTIFICATION_LIMIT, DEFAULT_PROFILE_MENU_LIMIT};

const APP_DIR: &str = "vitalrecords";
const ENV_PREFIX: &str = "VITALRECORDS_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub views: ViewsConfig,
}

/// Where the record store lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Unset means `records.db` in the platform's local data directory.
    pub database_path: Option<PathBuf>,
}

/// How many entries each derived view shows. Every limit must be positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewsConfig {
    pub activity_limit: usize,
    pub notification_limit: usize,
    pub search_limit: usize,
    pub profile_menu_limit: usize,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            activity_limit: DEFAULT_ACTIVITY_LIMIT,
            notification_limit: DEFAULT_NOTIFICATION_LIMIT,
            search_limit: DEFAULT_SEARCH_LIMIT,
            profile_menu_limit: DEFAULT_PROFILE_MENU_LIMIT,
        }
    }
}

impl Config {
    /// Load and validate the configuration. `config_path` replaces the
    /// default file location; a missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed or a limit is zero.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let file = config_path.unwrap_or_else(Self::default_config_path);
        let config: Self = Self::figment(&file).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// `<config_dir>/vitalrecords/config.toml`.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// `<data_local_dir>/vitalrecords`.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(APP_DIR)
    }

    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] naming the first zero limit.
    pub fn validate(&self) -> Result<()> {
        let views = &self.views;
        let zero = [
            ("views.activity_limit", views.activity_limit),
            ("views.notification_limit", views.notification_limit),
            ("views.search_limit", views.search_limit),
            ("views.profile_menu_limit", views.profile_menu_limit),
        ]
        .into_iter()
        .find(|(_, limit)| *limit == 0);

        match zero {
            Some((name, _)) => Err(Error::ConfigValidation {
                message: format!("{name} must be at least 1"),
            }),
            None => Ok(()),
        }
    }

    /// The configured database path, or the default one.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("records.db"))
    }
}
