//! Flat key/value configuration store
//!
//! Keys are lower-cased. Sources are merged in load order, later sources
//! overriding earlier ones: the global YAML file, then the project `.env`,
//! then command-line overrides.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_yaml::Value as YamlValue;

use crate::error::{Result, config as config_error, fs as fs_error};

/// Flat `<key> -> <value>` map backing [`super::Settings`]
#[derive(Debug, Clone, Default)]
pub struct KeyValueStore {
    values: BTreeMap<String, String>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, normalizing the key
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_ascii_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Merge a YAML mapping file. A missing file is not an error.
    pub fn merge_yaml_file(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            tracing::debug!("No configuration file at {}", path.display());
            return Ok(());
        }

        let content = fs::read_to_string(path).map_err(|e| fs_error::read_failed(path, e))?;
        self.merge_yaml_str(&content)
            .map_err(|e| config_error::parse_failed(path.display().to_string(), e.to_string()))
    }

    /// Merge YAML text. Only scalar values are accepted.
    pub fn merge_yaml_str(&mut self, content: &str) -> Result<()> {
        let document: YamlValue = serde_yaml::from_str(content)?;
        let mapping = match document {
            YamlValue::Mapping(mapping) => mapping,
            // An empty or fully commented-out file
            YamlValue::Null => return Ok(()),
            other => {
                return Err(config_error::parse_failed(
                    "yaml",
                    format!("expected a mapping at top level, found {}", yaml_kind(&other)),
                ));
            }
        };

        for (key, value) in mapping {
            let Some(key) = key.as_str() else {
                continue;
            };
            let value = match value {
                YamlValue::String(s) => s,
                YamlValue::Bool(b) => b.to_string(),
                YamlValue::Number(n) => n.to_string(),
                YamlValue::Null => String::new(),
                other => {
                    return Err(config_error::invalid(
                        key,
                        format!("{other:?}"),
                        format!("expected a scalar, found {}", yaml_kind(&other)),
                    ));
                }
            };
            self.set(key, value);
        }

        Ok(())
    }

    /// Merge a dotenv file. A missing file is not an error.
    pub fn merge_env_file(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            tracing::debug!("No project env file at {}", path.display());
            return Ok(());
        }

        let pairs = dotenvy::from_path_iter(path).map_err(|e| env_error(path, &e))?;
        self.merge_env_pairs(pairs).map_err(|e| env_error(path, &e))
    }

    /// Merge dotenv text
    #[cfg(test)]
    pub fn merge_env_str(&mut self, content: &str) -> Result<()> {
        self.merge_env_pairs(dotenvy::from_read_iter(content.as_bytes()))
            .map_err(|e| config_error::parse_failed(".env", e.to_string()))
    }

    fn merge_env_pairs(
        &mut self,
        pairs: impl Iterator<Item = std::result::Result<(String, String), dotenvy::Error>>,
    ) -> std::result::Result<(), dotenvy::Error> {
        for pair in pairs {
            let (key, value) = pair?;
            self.set(&key, value);
        }
        Ok(())
    }
}

fn env_error(path: &Path, err: &dotenvy::Error) -> crate::error::BerthError {
    config_error::parse_failed(path.display().to_string(), err.to_string())
}

fn yaml_kind(value: &YamlValue) -> &'static str {
    match value {
        YamlValue::Null => "null",
        YamlValue::Bool(_) => "boolean",
        YamlValue::Number(_) => "number",
        YamlValue::String(_) => "string",
        YamlValue::Sequence(_) => "sequence",
        YamlValue::Mapping(_) => "mapping",
        YamlValue::Tagged(_) => "tagged value",
    }
}
