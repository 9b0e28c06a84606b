//! Gateway configuration file
//!
//! The file is TOML: broker settings, optional logging settings and one
//! `[[modules]]` entry per module instance. Each entry's `args` table is
//! passed to the module's Create untouched.
//!
//! ```toml
//! [broker]
//! capacity = 10000
//!
//! [logging]
//! level = "info"
//! format = "text"
//!
//! [[modules]]
//! name = "hello"
//! module = "hello_world"
//!
//! [[modules]]
//! name = "log"
//! module = "logger"
//! [modules.args]
//! prefix = "gw"
//! ```

use crate::broker::DEFAULT_CAPACITY;
use crate::gateway::error::ConfigError;
use crate::module::ModuleConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const CONFIG_DIR_NAME: &str = "Modgate";
pub const CONFIG_FILE_NAME: &str = "modgate.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerSettings {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Logging overrides; command line flags take precedence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub format: Option<String>,
    pub file: Option<PathBuf>,
}

/// One module instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleEntry {
    /// Instance name, unique within the gateway
    pub name: String,
    /// Module type; resolves to the `GetApi_<module>` entry point
    pub module: String,
    #[serde(default)]
    pub args: Option<toml::Value>,
}

impl ModuleEntry {
    pub fn new(name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            args: None,
        }
    }

    pub fn with_args(mut self, args: toml::Table) -> Self {
        self.args = Some(toml::Value::Table(args));
        self
    }

    /// Configuration handed to Create, if the entry has any
    pub fn module_config(&self) -> Option<ModuleConfig> {
        self.args.clone().map(ModuleConfig::new)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub broker: BrokerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub modules: Vec<ModuleEntry>,
}

impl GatewayConfig {
    /// Configuration used when no file is found: the two built-in modules
    pub fn builtin_default() -> Self {
        let mut logger_args = toml::Table::new();
        logger_args.insert("prefix".to_string(), toml::Value::from("gateway"));
        Self {
            modules: vec![
                ModuleEntry::new("logger", "logger").with_args(logger_args),
                ModuleEntry::new("hello_world", "hello_world"),
            ],
            ..Self::default()
        }
    }

    /// Parse and validate configuration text; `origin` names it in errors
    pub fn from_toml_str(source: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: GatewayConfig = toml::from_str(source).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let config = Self::from_toml_str(&contents, path)?;
        log::debug!(
            "Loaded gateway configuration from {} ({} modules)",
            path.display(),
            config.modules.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.broker.capacity == 0 {
            return Err(ConfigError::Invalid {
                message: "broker capacity must be greater than zero".to_string(),
            });
        }
        if self.modules.is_empty() {
            return Err(ConfigError::Invalid {
                message: "at least one [[modules]] entry is required".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for entry in &self.modules {
            if entry.name.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    message: "module instance name must not be empty".to_string(),
                });
            }
            if entry.module.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    message: format!("module type for instance '{}' must not be empty", entry.name),
                });
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::Invalid {
                    message: format!("duplicate module instance name '{}'", entry.name),
                });
            }
        }
        Ok(())
    }
}

/// Default configuration file location: `<config dir>/Modgate/modgate.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Pick the configuration file to load
///
/// An explicitly given path must exist. Without one, the default location is
/// used if a file is there; otherwise `None`.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Result<Option<PathBuf>, ConfigError> {
    match explicit {
        Some(path) if path.exists() => Ok(Some(path)),
        Some(path) => Err(ConfigError::Io {
            message: "the specified configuration file does not exist".to_string(),
            path,
        }),
        None => Ok(default_config_path().filter(|path| path.exists())),
    }
}
