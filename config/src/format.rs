use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// Document format of a config or definition file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Picks the format from the file extension: `.json` is JSON, anything
    /// else is YAML.
    ///
    /// # Examples
    ///
    /// ```
    /// use optree_config::ConfigFormat;
    ///
    /// assert_eq!(ConfigFormat::from_path("app.JSON"), ConfigFormat::Json);
    /// assert_eq!(ConfigFormat::from_path(".apprc"), ConfigFormat::Yaml);
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }

    pub(crate) fn parse<T: DeserializeOwned>(self, contents: &str) -> Result<T> {
        Ok(match self {
            Self::Yaml => serde_yaml::from_str(contents)?,
            Self::Json => serde_json::from_str(contents)?,
        })
    }

    /// Serializes `value` in this format.
    pub fn render<T: Serialize>(self, value: &T) -> Result<String> {
        Ok(match self {
            Self::Yaml => serde_yaml::to_string(value)?,
            Self::Json => serde_json::to_string_pretty(value)?,
        })
    }
}
