//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/qtree/qtree.toml`
//! 3. Environment variables: `QTREE_*` prefix
//! 4. Command line overrides (applied by the CLI after loading)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::LayoutConfig;

/// Key the forest is stored under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "treeNodes";

/// Largest number of auto-generated children one form submission may ask for.
pub const DEFAULT_MAX_CHILDREN: usize = 1000;

/// Raw layout config for intermediate parsing (fields are Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawLayoutConfig {
    pub level_spacing: Option<f64>,
    pub sibling_spacing: Option<f64>,
    pub origin_x: Option<f64>,
    pub origin_y: Option<f64>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<PathBuf>,
    pub storage_key: Option<String>,
    pub max_children: Option<usize>,
    pub layout: RawLayoutConfig,
}

/// Unified configuration for qtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the stored forest
    pub data_dir: PathBuf,
    /// Key the forest is stored under (file `<data_dir>/<key>.json`)
    pub storage_key: String,
    /// Upper bound for a requested child count
    pub max_children: usize,
    /// Diagram spacing
    pub layout: LayoutConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            max_children: DEFAULT_MAX_CHILDREN,
            layout: LayoutConfig::default(),
        }
    }
}

/// Platform data directory for qtree, or `~/.qtree` if none can be determined.
fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "qtree")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.qtree"))
}

/// Get the XDG config directory for qtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "qtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("qtree.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`; leaves the input as is if expansion fails.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl LayoutConfig {
    /// Overlay wins where it specifies a value.
    fn merge(&self, overlay: &RawLayoutConfig) -> Self {
        Self {
            level_spacing: overlay.level_spacing.unwrap_or(self.level_spacing),
            sibling_spacing: overlay.sibling_spacing.unwrap_or(self.sibling_spacing),
            origin_x: overlay.origin_x.unwrap_or(self.origin_x),
            origin_y: overlay.origin_y.unwrap_or(self.origin_y),
        }
    }
}

impl Settings {
    /// Path of the file holding the stored forest.
    pub fn forest_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.storage_key))
    }

    fn expand_paths(&mut self) {
        self.data_dir = expand_path(&self.data_dir);
    }

    /// Overlay config onto self: every specified field replaces the current value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_dir: overlay
                .data_dir
                .clone()
                .unwrap_or_else(|| self.data_dir.clone()),
            storage_key: overlay
                .storage_key
                .clone()
                .unwrap_or_else(|| self.storage_key.clone()),
            max_children: overlay.max_children.unwrap_or(self.max_children),
            layout: self.layout.merge(&overlay.layout),
        }
    }

    /// Load settings with layered precedence from the standard global config location.
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Load settings with an explicit global config file.
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. `global_path`, if it exists
    /// 3. Environment variables: `QTREE_*` prefix, `__` between nested keys
    pub fn load_from(global_path: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_with(global_path, env_source())
    }

    /// Like [`Settings::load_from`] with an explicit environment source.
    pub fn load_with(
        global_path: Option<&Path>,
        env: Environment,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(path) = global_path {
            if path.exists() {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current, env)?;
        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Apply QTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_dir") {
            settings.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("storage_key") {
            settings.storage_key = val;
        }
        if let Ok(val) = config.get_int("max_children") {
            settings.max_children = usize::try_from(val).map_err(|_| ApplicationError::Config {
                message: format!("max_children must not be negative: {val}"),
            })?;
        }
        if let Ok(val) = config.get_float("layout.level_spacing") {
            settings.layout.level_spacing = val;
        }
        if let Ok(val) = config.get_float("layout.sibling_spacing") {
            settings.layout.sibling_spacing = val;
        }
        if let Ok(val) = config.get_float("layout.origin_x") {
            settings.layout.origin_x = val;
        }
        if let Ok(val) = config.get_float("layout.origin_y") {
            settings.layout.origin_y = val;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.storage_key.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "storage_key must not be empty".into(),
            });
        }
        let spacings = [
            self.layout.level_spacing,
            self.layout.sibling_spacing,
            self.layout.origin_x,
            self.layout.origin_y,
        ];
        if spacings.iter().any(|v| !v.is_finite()) {
            return Err(ApplicationError::Config {
                message: "layout values must be finite numbers".into(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# qtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/qtree/qtree.toml
#   Env:    QTREE_* environment variables, e.g. QTREE_STORAGE_KEY,
#           QTREE_LAYOUT__SIBLING_SPACING
#   CLI:    --data-dir

# Directory holding the stored forest
# data_dir = "~/.local/share/qtree"

# Key (file name without .json) the forest is stored under
# storage_key = "treeNodes"

# Largest child count one add/edit/resize may request
# max_children = 1000

[layout]
# Vertical distance between a node and its parent
# level_spacing = 150.0

# Horizontal distance between neighbours on one level
# sibling_spacing = 200.0

# Position roots are measured from
# origin_x = 500.0
# origin_y = 0.0
"#
        .to_string()
    }
}

/// `QTREE_*` variables; `__` separates nested keys (`QTREE_LAYOUT__ORIGIN_X`).
pub fn env_source() -> Environment {
    Environment::with_prefix("QTREE")
        .prefix_separator("_")
        .separator("__")
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
