//! Config file decoding.
//!
//! A config file maps command keys to their argument slots. The positional
//! slot is spelled `args`:
//!
//! ```yaml
//! test-command:
//!   args: [value]
//!   --option: true
//! next-command:
//!   --required: [a, b]
//! ```
//!
//! Scalars become single-element lists, sequences keep their scalar members,
//! and anything else (nulls, nested mappings, commands that are not mappings)
//! is dropped.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use optree_core::{ArgSlot, Application, IndexedArguments};
use serde::Deserialize;
use serde::de::IgnoredAny;
use tracing::{debug, warn};

use crate::error::Result;
use crate::format::ConfigFormat;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl fmt::Display for RawScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            // `{:?}` keeps the fractional part of whole floats (`1.0`).
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Scalar(RawScalar),
    List(Vec<RawValue>),
    Other(IgnoredAny),
}

impl RawValue {
    fn into_values(self) -> Option<Vec<String>> {
        match self {
            Self::Scalar(scalar) => Some(vec![scalar.to_string()]),
            Self::List(items) => Some(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Self::Scalar(scalar) => Some(scalar.to_string()),
                        _ => None,
                    })
                    .collect(),
            ),
            Self::Other(_) => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCommand {
    Slots(BTreeMap<String, RawValue>),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDocument {
    Commands(BTreeMap<String, RawCommand>),
    Other(IgnoredAny),
}

/// Decodes config `contents` in `format`.
///
/// Returns `Ok(None)` for an empty document or one without any command
/// mapping.
///
/// # Errors
///
/// [`ConfigError::YamlError`](crate::ConfigError::YamlError) or
/// [`ConfigError::JsonError`](crate::ConfigError::JsonError) when the
/// document is malformed.
///
/// # Examples
///
/// ```
/// use optree_config::{ConfigFormat, decode_config};
///
/// let yaml = "test-command:\n  args: [value]\n  --option: true\n";
/// let index = decode_config(yaml, ConfigFormat::Yaml).unwrap().unwrap();
///
/// assert_eq!(index.positional("test-command").unwrap(), ["value"]);
/// assert_eq!(index.named("test-command", "--option").unwrap(), ["true"]);
/// ```
pub fn decode_config(contents: &str, format: ConfigFormat) -> Result<Option<IndexedArguments>> {
    if contents.trim().is_empty() {
        return Ok(None);
    }

    let RawDocument::Commands(commands) = format.parse::<RawDocument>(contents)? else {
        debug!("Config document is not a mapping, ignoring");
        return Ok(None);
    };

    let mut index = IndexedArguments::new();
    for (command, raw) in commands {
        let RawCommand::Slots(slots) = raw else {
            debug!(command = %command, "Skipping non-mapping config entry");
            continue;
        };
        for (key, value) in slots {
            if let Some(values) = value.into_values() {
                index.insert(command.as_str(), ArgSlot::from_key(&key), values);
            }
        }
    }

    Ok((!index.is_empty()).then_some(index))
}

/// Loads the config file at `path`, if any.
///
/// A missing path, or a file that does not exist or cannot be read, yields
/// `Ok(None)`.
///
/// # Errors
///
/// Decoding errors from [`decode_config`].
pub fn load_config(path: Option<&Path>) -> Result<Option<IndexedArguments>> {
    let Some(path) = path else {
        return Ok(None);
    };

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Config file not found");
            return Ok(None);
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Config file unreadable, ignoring");
            return Ok(None);
        }
    };

    let index = decode_config(&contents, ConfigFormat::from_path(path))?;
    debug!(
        path = %path.display(),
        commands = index.as_ref().map_or(0, IndexedArguments::len),
        "Loaded config"
    );
    Ok(index)
}

/// Loads an [`Application`] definition (name, help texts and option groups)
/// from a YAML or JSON file.
///
/// # Errors
///
/// [`ConfigError::IoError`](crate::ConfigError::IoError) if the file cannot
/// be read, or a parse error if it is not a valid definition.
pub fn load_definition(path: impl AsRef<Path>) -> Result<Application> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let app: Application = ConfigFormat::from_path(path).parse(&contents)?;
    debug!(
        path = %path.display(),
        name = %app.name,
        groups = app.groups.len(),
        "Loaded definition"
    );
    Ok(app)
}
