use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::{
    attributes::Visibility,
    error::{Error, Result},
};

pub const OPTION_VISIBILITY: &str = "visibility";
pub const OPTION_RETAIN_VISIBILITY: &str = "retain_visibility";
pub const OPTION_CHECKSUM_ALGO: &str = "checksum_algo";
pub const OPTION_PREFIX: &str = "prefix";
pub const OPTION_TOKEN: &str = "token";
pub const OPTION_DRIVER: &str = "driver";

/// Digests the remote provider precomputes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Md5,
    Sha256,
}

impl ChecksumAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "md5" => Ok(Self::Md5),
            "sha256" => Ok(Self::Sha256),
            other => Err(Error::UnsupportedChecksumAlgorithm {
                algorithm: other.to_owned(),
            }),
        }
    }
}

/// Immutable set of options passed to a single operation.
///
/// Builder methods return a new value, the original is never modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    settings: BTreeMap<String, Value>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `key` set to `value`
    #[must_use]
    pub fn with<K, V>(&self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut settings = self.settings.clone();
        let _ = settings.insert(key.into(), value.into());
        Self { settings }
    }

    /// Returns a copy where the settings of `other` take precedence
    #[must_use]
    pub fn extend(&self, other: &Config) -> Self {
        let mut settings = self.settings.clone();
        settings.extend(other.settings.clone());
        Self { settings }
    }

    /// Returns a copy without the given keys
    #[must_use]
    pub fn without_settings(&self, keys: &[&str]) -> Self {
        let settings = self
            .settings
            .iter()
            .filter(|(k, _)| !keys.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { settings }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.settings.get(key).filter(|v| !v.is_null())
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(invalid(key, other)),
        }
    }

    /// Reads a flag, accepting JSON booleans and the strings `true`/`false`/`1`/`0`
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) if s == "true" || s == "1" => Ok(Some(true)),
            Some(Value::String(s)) if s == "false" || s == "0" => Ok(Some(false)),
            Some(Value::Number(n)) if n.as_u64() == Some(1) => Ok(Some(true)),
            Some(Value::Number(n)) if n.as_u64() == Some(0) => Ok(Some(false)),
            Some(other) => Err(invalid(key, other)),
        }
    }

    pub fn visibility(&self) -> Result<Option<Visibility>> {
        match self.get(OPTION_VISIBILITY) {
            None => Ok(None),
            Some(Value::String(s)) => s.parse().map(Some),
            Some(other) => Err(Error::InvalidVisibility {
                value: other.to_string(),
            }),
        }
    }

    pub fn retain_visibility(&self) -> Result<Option<bool>> {
        self.get_bool(OPTION_RETAIN_VISIBILITY)
    }

    pub fn checksum_algorithm(&self) -> Result<Option<ChecksumAlgorithm>> {
        match self.get(OPTION_CHECKSUM_ALGO) {
            None => Ok(None),
            Some(Value::String(s)) => s.parse().map(Some),
            Some(other) => Err(Error::UnsupportedChecksumAlgorithm {
                algorithm: other.to_string(),
            }),
        }
    }

    pub fn prefix(&self) -> Result<Option<&str>> {
        self.get_str(OPTION_PREFIX)
    }
}

impl<K, V> FromIterator<(K, V)> for Config
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            settings: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn invalid(key: &str, value: &Value) -> Error {
    Error::InvalidOption {
        key: key.to_owned(),
        value: value.to_string(),
    }
}

/// Adapter-level defaults, overlaid by the per-call [`Config`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub visibility: Visibility,
    pub retain_visibility: bool,
    pub checksum_algorithm: ChecksumAlgorithm,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            visibility: Visibility::Private,
            retain_visibility: true,
            checksum_algorithm: ChecksumAlgorithm::Md5,
        }
    }
}

impl Options {
    /// Resolves the defaults from a config map, falling back to the hardcoded ones.
    pub fn from_config(config: &Config) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            visibility: config.visibility()?.unwrap_or(defaults.visibility),
            retain_visibility: config
                .retain_visibility()?
                .unwrap_or(defaults.retain_visibility),
            checksum_algorithm: config
                .checksum_algorithm()?
                .unwrap_or(defaults.checksum_algorithm),
        })
    }

    pub fn visibility(&self, config: &Config) -> Result<Visibility> {
        Ok(config.visibility()?.unwrap_or(self.visibility))
    }

    pub fn retain_visibility(&self, config: &Config) -> Result<bool> {
        Ok(config.retain_visibility()?.unwrap_or(self.retain_visibility))
    }

    pub fn checksum_algorithm(&self, config: &Config) -> Result<ChecksumAlgorithm> {
        Ok(config
            .checksum_algorithm()?
            .unwrap_or(self.checksum_algorithm))
    }
}
