use std::collections::BTreeMap;
use std::path::Path;

use plugboard::StdError;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Application configuration split into named JSON sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub(crate) sections: BTreeMap<String, serde_json::Value>,
}

/// A typed configuration section stored under a fixed key.
pub trait ConfigSection: DeserializeOwned {
    fn key() -> &'static str;
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserializes the section stored under `name`.
    ///
    /// A missing section deserializes from `null`, so `Option<T>` yields `None`.
    pub fn get<T>(&self, name: impl AsRef<str>) -> Result<T, StdError>
    where
        T: DeserializeOwned,
    {
        let value = self
            .sections
            .get(name.as_ref())
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    /// Deserializes a typed section, returning `None` if it is absent.
    pub fn section<T>(&self) -> Result<Option<T>, StdError>
    where
        T: ConfigSection,
    {
        self.get::<Option<T>>(T::key())
    }

    pub fn set<T>(&mut self, name: impl Into<String>, value: T) -> Result<(), StdError>
    where
        T: Serialize,
    {
        self.sections
            .insert(name.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Builder form of [`Config::set`].
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be represented as JSON.
    pub fn with<T>(mut self, name: impl Into<String>, value: T) -> Self
    where
        T: Serialize,
    {
        self.set(name, value).unwrap();
        self
    }

    pub fn contains(&self, name: impl AsRef<str>) -> bool {
        self.sections.contains_key(name.as_ref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Merges `other` into this config.
    ///
    /// Objects are merged recursively, arrays are concatenated and any other
    /// value is replaced by the value from `other`.
    pub fn merge_from(&mut self, other: Self) {
        for (key, value) in other.sections {
            let entry = self.sections.entry(key);
            merge_json_from(entry.or_insert(serde_json::Value::Null), value);
        }
    }

    pub fn parse<T>(text: T) -> Result<Self, StdError>
    where
        T: AsRef<str>,
    {
        Ok(serde_json::from_str(text.as_ref())?)
    }

    pub async fn parse_file(path: impl AsRef<Path>) -> Result<Self, StdError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Loading config file");
        let text = tokio::fs::read_to_string(path).await?;
        Self::parse(text)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Number of top-level sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }
}

fn merge_json_from(lhs: &mut serde_json::Value, rhs: serde_json::Value) {
    match (lhs, rhs) {
        (serde_json::Value::Object(l), serde_json::Value::Object(r)) => {
            for (key, value) in r {
                merge_json_from(l.entry(key).or_insert(serde_json::Value::Null), value);
            }
        }
        (serde_json::Value::Array(l), serde_json::Value::Array(r)) => l.extend(r),
        (lhs, rhs) => *lhs = rhs,
    }
}
