//! Opaque module configuration handed to Create

use serde::de::DeserializeOwned;

/// Configuration for one module instance
///
/// The host passes it through untouched; only the module knows its schema
/// and decodes it with [`deserialize`](Self::deserialize).
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleConfig {
    value: toml::Value,
}

impl ModuleConfig {
    pub fn new(value: toml::Value) -> Self {
        Self { value }
    }

    /// Empty table
    pub fn empty() -> Self {
        Self::new(toml::Value::Table(toml::Table::new()))
    }

    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = toml::from_str(source)?;
        Ok(Self::new(toml::Value::Table(table)))
    }

    pub fn value(&self) -> &toml::Value {
        &self.value
    }

    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.value.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(toml::Value::as_str)
    }

    /// Decode into the module's own configuration type
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, toml::de::Error> {
        self.value.clone().try_into()
    }
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<toml::Value> for ModuleConfig {
    fn from(value: toml::Value) -> Self {
        Self::new(value)
    }
}

impl From<toml::Table> for ModuleConfig {
    fn from(table: toml::Table) -> Self {
        Self::new(toml::Value::Table(table))
    }
}
