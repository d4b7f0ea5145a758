use crate::error::ConfigError;
use crate::providers::application::{self, ApplicationOptions};
use crate::providers::directory::{self, DirectoryOptions};
use directories::{BaseDirs, ProjectDirs};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Set to a non-empty value to skip every configuration file.
pub const NO_CONFIG_ENV: &str = "SLING_NO_CONFIG";

/// Resolved configuration: compiled defaults with at most one file layered on top.
#[derive(Debug, Clone)]
pub struct Config {
    pub visible_items: usize,
    pub icon_size: u32,
    values: Map<String, Value>,
}

#[derive(Deserialize, Debug)]
struct GeneralConfig {
    #[serde(default = "default_visible_items")]
    visible_items: usize,
    #[serde(default = "default_icon_size")]
    icon_size: u32,
}

fn default_visible_items() -> usize { 5 }
fn default_icon_size() -> u32 { 44 }

fn section_defaults<T: Serialize>(options: T) -> Value {
    serde_json::to_value(options).unwrap_or_else(|_| Value::Object(Map::new()))
}

/// The compiled-in configuration mapping.
pub fn default_mapping() -> Map<String, Value> {
    let mut values = Map::new();
    values.insert("visible_items".to_string(), default_visible_items().into());
    values.insert("icon_size".to_string(), default_icon_size().into());
    values.insert(directory::NAME.to_string(), section_defaults(DirectoryOptions::default()));
    values.insert(application::NAME.to_string(), section_defaults(ApplicationOptions::default()));
    values
}

/// Overlays `overlay` onto `base`. Sub-mappings present on both sides are merged
/// key by key; anything else is replaced. The overlay always wins.
pub fn merge(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        if let Value::Object(keys) = value {
            if let Some(Value::Object(section)) = base.get_mut(&key) {
                section.extend(keys);
                continue;
            }
            base.insert(key, Value::Object(keys));
        } else {
            base.insert(key, value);
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            visible_items: default_visible_items(),
            icon_size: default_icon_size(),
            values: default_mapping(),
        }
    }
}

impl Config {
    /// Defaults with `overlay` merged on top.
    pub fn layered(overlay: Map<String, Value>) -> Result<Self, ConfigError> {
        let mut values = default_mapping();
        merge(&mut values, overlay);
        Self::from_mapping(values)
    }

    fn from_mapping(values: Map<String, Value>) -> Result<Self, ConfigError> {
        let general: GeneralConfig = serde_json::from_value(Value::Object(values.clone()))
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(Self {
            visible_items: general.visible_items,
            icon_size: general.icon_size,
            values,
        })
    }

    /// The sub-mapping for a provider. Missing or non-mapping sections come back empty.
    pub fn section(&self, name: &str) -> Map<String, Value> {
        self.values
            .get(name)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}

pub fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(base_dirs) = BaseDirs::new() {
        paths.push(base_dirs.home_dir().join(".slingrc"));
    }
    if let Some(proj_dirs) = ProjectDirs::from("org", "sling", "sling") {
        paths.push(proj_dirs.config_dir().join("config.toml"));
    }
    paths
}

/// Loads the configuration, falling back to defaults whenever nothing usable is found.
pub fn load_config() -> Config {
    if env::var(NO_CONFIG_ENV).is_ok_and(|v| !v.is_empty()) {
        info!("{} is set, using default configuration", NO_CONFIG_ENV);
        return Config::default();
    }

    load_first(&candidate_paths())
}

/// Returns the first candidate that loads. Broken files are reported and skipped.
pub fn load_first(candidates: &[PathBuf]) -> Config {
    for path in candidates {
        if !path.exists() {
            debug!("No configuration at {:?}", path);
            continue;
        }

        match load_file(path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", path);
                return config;
            }
            Err(e) => report_unloadable(&mut io::stderr(), path, &e),
        }
    }

    Config::default()
}

/// Tells the user about a broken file on `out` as well, whatever the log level.
pub fn report_unloadable<W: Write>(out: &mut W, path: &Path, err: &ConfigError) {
    warn!("Configuration {} could not be loaded: {}", path.display(), err);
    let _ = writeln!(out, "Configuration {} could not be loaded", path.display());
}

/// Parses one file (TOML for `.toml`, JSON otherwise) and layers it over the defaults.
pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: Value = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };

    match value {
        Value::Object(overlay) => Config::layered(overlay),
        _ => Err(ConfigError::NotAMapping),
    }
}
