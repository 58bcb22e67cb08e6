//! Argument indexing.
//!
//! Converts a flat token list such as
//!
//! ```text
//! command arg1 arg2 --option value1 value2
//! ```
//!
//! into an [`IndexedArguments`] map:
//!
//! ```text
//! command:
//!   <positional>: [arg1, arg2]
//!   --option:     [value1, value2]
//! ```
//!
//! A key's values are every token after it up to the next token that is a
//! known key. While indexing, keys and tokens are compared with their
//! leading dashes stripped, so `--o` still ends the span of a preceding key
//! when `-o` is declared. Unknown-key detection later compares tokens
//! literally against declared aliases, so a resolved command line must
//! spell each key exactly as declared: `--o` is reported as unknown.

use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{OptionGroup, OptionNode, all_keys};

/// Key that spells the positional slot in config files and flat maps.
///
/// ```yaml
/// add:
///   args:
///     - /some/file
/// ```
pub const ARGS_KEY: &str = "args";

/// Slot inside a command entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArgSlot {
    /// Values attached directly to the command key.
    Positional,
    /// Values of a child option, keyed by the alias that matched.
    Named(String),
}

impl ArgSlot {
    /// Maps a flat-map key to a slot; [`ARGS_KEY`] is the positional slot.
    pub fn from_key(key: &str) -> Self {
        if key == ARGS_KEY {
            Self::Positional
        } else {
            Self::Named(key.to_string())
        }
    }

    /// Inverse of [`from_key`](Self::from_key).
    pub fn as_key(&self) -> &str {
        match self {
            Self::Positional => ARGS_KEY,
            Self::Named(key) => key,
        }
    }
}

/// Slots of a single command key.
pub type CommandEntry = BTreeMap<ArgSlot, Vec<String>>;

/// The boundary representation: `command -> key -> values`, with the
/// positional slot spelled [`ARGS_KEY`].
pub type FlatIndex = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Arguments grouped by command key, then by slot.
///
/// Produced by [`index_arguments`] for CLI tokens and environment pairs, and
/// by config decoders for files. Serializes as a [`FlatIndex`].
///
/// # Examples
///
/// ```
/// use optree_core::{ArgSlot, IndexedArguments};
///
/// let mut index = IndexedArguments::new();
/// index.insert("deploy", ArgSlot::Positional, vec!["prod".into()]);
/// index.insert("deploy", ArgSlot::Named("--force".into()), vec![]);
///
/// assert_eq!(index.positional("deploy"), Some(&["prod".to_string()][..]));
/// assert!(index.contains_named("--force"));
/// assert_eq!(
///     serde_json::to_string(&index).unwrap(),
///     r#"{"deploy":{"--force":[],"args":["prod"]}}"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FlatIndex", into = "FlatIndex")]
pub struct IndexedArguments {
    commands: BTreeMap<String, CommandEntry>,
}

impl IndexedArguments {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of command keys.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no command keys are present.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Sets `values` for `slot` under `command`, replacing earlier values.
    pub fn insert(&mut self, command: impl Into<String>, slot: ArgSlot, values: Vec<String>) {
        self.commands
            .entry(command.into())
            .or_default()
            .insert(slot, values);
    }

    /// Returns the entry for `command`.
    pub fn entry(&self, command: &str) -> Option<&CommandEntry> {
        self.commands.get(command)
    }

    pub(crate) fn entry_mut(&mut self, command: &str) -> &mut CommandEntry {
        self.commands.entry(command.to_string()).or_default()
    }

    /// Returns `true` if `command` is a top-level key.
    pub fn contains_command(&self, command: &str) -> bool {
        self.commands.contains_key(command)
    }

    /// Positional values of `command`.
    pub fn positional(&self, command: &str) -> Option<&[String]> {
        self.entry(command)?
            .get(&ArgSlot::Positional)
            .map(Vec::as_slice)
    }

    /// Values of child option `key` under `command`.
    pub fn named(&self, command: &str, key: &str) -> Option<&[String]> {
        self.entry(command)?
            .get(&ArgSlot::Named(key.to_string()))
            .map(Vec::as_slice)
    }

    /// Values of child option `key` under the first command that has it.
    pub fn find_named(&self, key: &str) -> Option<&[String]> {
        let slot = ArgSlot::Named(key.to_string());
        self.commands
            .values()
            .find_map(|entry| entry.get(&slot))
            .map(Vec::as_slice)
    }

    /// Returns `true` if any command has a child slot named `key`.
    pub fn contains_named(&self, key: &str) -> bool {
        self.find_named(key).is_some()
    }

    /// Iterates command keys in sorted order.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Iterates `(command, entry)` pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommandEntry)> {
        self.commands.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keeps only the commands for which `keep` returns `true`.
    pub fn retain_commands(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.commands.retain(|command, _| keep(command));
    }

    /// Converts from the boundary representation.
    pub fn from_flat(flat: FlatIndex) -> Self {
        let commands = flat
            .into_iter()
            .map(|(command, slots)| {
                let entry = slots
                    .into_iter()
                    .map(|(key, values)| (ArgSlot::from_key(&key), values))
                    .collect();
                (command, entry)
            })
            .collect();
        Self { commands }
    }

    /// Converts to the boundary representation.
    ///
    /// A child option literally named [`ARGS_KEY`] collides with the
    /// positional slot; the positional values win.
    pub fn to_flat(&self) -> FlatIndex {
        self.commands
            .iter()
            .map(|(command, entry)| {
                let mut slots = BTreeMap::new();
                for (slot, values) in entry {
                    match slot {
                        ArgSlot::Positional => {
                            slots.insert(ARGS_KEY.to_string(), values.clone());
                        }
                        ArgSlot::Named(key) => {
                            slots.entry(key.clone()).or_insert_with(|| values.clone());
                        }
                    }
                }
                (command.clone(), slots)
            })
            .collect()
    }
}

impl From<FlatIndex> for IndexedArguments {
    fn from(flat: FlatIndex) -> Self {
        Self::from_flat(flat)
    }
}

impl From<IndexedArguments> for FlatIndex {
    fn from(index: IndexedArguments) -> Self {
        index.to_flat()
    }
}

/// Removes every leading `-` from `token`.
///
/// # Examples
///
/// ```
/// use optree_core::strip_dash_prefix;
///
/// assert_eq!(strip_dash_prefix("-option-name"), "option-name");
/// assert_eq!(strip_dash_prefix("--option-name"), "option-name");
/// assert_eq!(strip_dash_prefix("option-name"), "option-name");
/// ```
pub fn strip_dash_prefix(token: &str) -> &str {
    token.trim_start_matches('-')
}

/// Locates `key` in `arguments` and the extent of its values.
///
/// The range starts at the key's position and ends at the next token that is
/// one of `keys` (other than `key` itself), or at the end of `arguments`. The
/// values are therefore `arguments[range.start + 1..range.end]`.
///
/// # Examples
///
/// ```
/// use optree_core::value_span;
///
/// let keys = ["one", "two", "three"];
/// let arguments = ["/binary/path", "one", "two", "a", "b", "three"];
/// assert_eq!(value_span("two", &arguments, &keys), Some(2..5));
///
/// let arguments = ["/binary/path", "one", "two", "a", "b"];
/// assert_eq!(value_span("two", &arguments, &keys), Some(2..5));
/// assert_eq!(value_span("four", &arguments, &keys), None);
/// ```
pub fn value_span<S: AsRef<str>>(key: &str, arguments: &[S], keys: &[&str]) -> Option<Range<usize>> {
    let key = strip_dash_prefix(key);
    let position = arguments
        .iter()
        .position(|token| strip_dash_prefix(token.as_ref()) == key)?;

    let end = arguments[position + 1..]
        .iter()
        .position(|token| {
            let token = strip_dash_prefix(token.as_ref());
            token != key && keys.iter().any(|k| strip_dash_prefix(k) == token)
        })
        .map(|offset| position + 1 + offset)
        .unwrap_or(arguments.len());

    Some(position..end)
}

/// Values following `key`, as raw tokens.
///
/// Repeated occurrences of `key` inside its own span are dropped, so
/// `-i a -i b` yields `[a, b]` for `-i`.
fn span_values<S: AsRef<str>>(key: &str, arguments: &[S], keys: &[&str]) -> Option<Vec<String>> {
    let range = value_span(key, arguments, keys)?;
    let stripped = strip_dash_prefix(key);
    Some(
        arguments[range.start + 1..range.end]
            .iter()
            .map(|token| token.as_ref())
            .filter(|token| strip_dash_prefix(token) != stripped)
            .map(String::from)
            .collect(),
    )
}

fn collect_descendants<'a>(option: &'a OptionNode, out: &mut Vec<&'a OptionNode>) {
    for child in option.children() {
        out.push(child);
        collect_descendants(child, out);
    }
}

/// Indexes a single root option.
///
/// Each matched alias of `option` gets its positional values. Descendants of
/// `option` (at any depth) are indexed as named slots under the first alias
/// of `option` that matched; if `option` itself is absent, so are they.
pub fn index_option<S: AsRef<str>>(
    option: &OptionNode,
    arguments: &[S],
    keys: &[&str],
) -> IndexedArguments {
    let mut result = IndexedArguments::new();
    let mut root: Option<&str> = None;

    for key in &option.keys {
        if let Some(values) = span_values(key, arguments, keys) {
            result.insert(key.as_str(), ArgSlot::Positional, values);
            if root.is_none() {
                root = Some(key.as_str());
            }
        }
    }

    let Some(root) = root else {
        return result;
    };

    let mut descendants = Vec::new();
    collect_descendants(option, &mut descendants);
    for descendant in descendants {
        for key in &descendant.keys {
            if let Some(values) = span_values(key, arguments, keys) {
                result.insert(root, ArgSlot::Named(key.clone()), values);
            }
        }
    }

    result
}

/// Indexes `arguments` against every root option in `groups`.
///
/// `arguments` must not include the program path.
///
/// # Examples
///
/// ```
/// use optree_core::*;
///
/// let groups = vec![OptionGroup::new("Commands:").with_option(
///     OptionNode::with_value(&["test-command"], "Test")
///         .with_optional(OptionNode::flag(&["-o", "--option"], "Option")),
/// )];
///
/// let index = index_arguments(&["test-command", "value", "-o", "x"], &groups);
/// assert_eq!(index.positional("test-command"), Some(&["value".to_string()][..]));
/// assert_eq!(index.named("test-command", "-o"), Some(&["x".to_string()][..]));
/// ```
pub fn index_arguments<S: AsRef<str>>(arguments: &[S], groups: &[OptionGroup]) -> IndexedArguments {
    let keys = all_keys(groups);
    let mut result = IndexedArguments::new();

    for option in groups.iter().flat_map(|group| group.options.iter()) {
        for (command, entry) in index_option(option, arguments, &keys).commands {
            result.entry_mut(&command).extend(entry);
        }
    }

    debug!(
        tokens = arguments.len(),
        commands = ?result.commands().collect::<Vec<_>>(),
        "Indexed arguments"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<OptionGroup> {
        let command = OptionNode::with_value(&["test-command"], "Test a custom command")
            .with_optional(OptionNode::flag(&["-o", "--option"], "Some option").with_default("d"))
            .with_required(OptionNode::flag(&["-a", "--alternate-option"], "Alternate"));
        let next = OptionNode::flag(&["next-command"], "Another command")
            .with_required(OptionNode::with_value(&["-r", "--required"], "Required"));
        vec![
            OptionGroup::new("Commands:")
                .with_option(command)
                .with_option(next),
        ]
    }

    #[test]
    fn test_value_span_adjacent_key() {
        let keys = ["one", "two", "three"];
        let arguments = ["/binary/path", "one", "two", "three"];

        assert_eq!(value_span("two", &arguments, &keys), Some(2..3));
    }

    #[test]
    fn test_value_span_matches_across_dash_styles() {
        let keys = ["-o", "--option", "cmd"];
        let arguments = ["cmd", "--o", "x", "option"];

        assert_eq!(value_span("-o", &arguments, &keys), Some(1..3));
    }

    #[test]
    fn test_index_arguments_command_and_option() {
        let index = index_arguments(&["test-command", "cli-value", "-o", "opt-value"], &groups());

        assert_eq!(index.len(), 1);
        assert_eq!(index.positional("test-command").unwrap(), ["cli-value"]);
        assert_eq!(index.named("test-command", "-o").unwrap(), ["opt-value"]);
        assert!(index.named("test-command", "--option").is_none());
    }

    #[test]
    fn test_index_option_without_keys_is_empty() {
        let option = OptionNode::flag(&[], "");
        let result = index_option(&option, &Vec::<String>::new(), &[]);
        assert!(result.is_empty());
    }

    #[test]
    fn test_index_option_without_children_still_matches() {
        let option = OptionNode::with_value(&["test-command"], "");
        let keys = ["test-command", "-o"];
        let result = index_option(&option, &["test-command", "command value", "-o", "x"], &keys);

        assert_eq!(result.len(), 1);
        assert_eq!(result.positional("test-command").unwrap(), ["command value"]);
        assert_eq!(result.entry("test-command").unwrap().len(), 1);
    }

    #[test]
    fn test_children_are_dropped_when_root_is_absent() {
        let index = index_arguments(&["-o", "x"], &groups());
        assert!(index.is_empty());
    }

    #[test]
    fn test_children_nest_under_matched_alias() {
        let groups = vec![OptionGroup::new("").with_option(
            OptionNode::flag(&["b", "build"], "")
                .with_optional(OptionNode::flag(&["--release"], "")),
        )];
        let index = index_arguments(&["build", "--release"], &groups);

        assert!(index.contains_command("build"));
        assert!(!index.contains_command("b"));
        assert!(index.named("build", "--release").is_some());
    }

    #[test]
    fn test_grandchildren_are_indexed() {
        let groups = vec![OptionGroup::new("").with_option(
            OptionNode::flag(&["remote"], "").with_optional(
                OptionNode::with_value(&["add"], "")
                    .with_optional(OptionNode::flag(&["--fetch"], "")),
            ),
        )];
        let index = index_arguments(&["remote", "add", "origin", "--fetch"], &groups);

        assert_eq!(index.named("remote", "add").unwrap(), ["origin"]);
        assert_eq!(index.named("remote", "--fetch").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_values_keep_raw_tokens() {
        let groups = vec![OptionGroup::new("").with_option(
            OptionNode::with_value(&["offset"], ""),
        )];
        let index = index_arguments(&["offset", "-5"], &groups);

        assert_eq!(index.positional("offset").unwrap(), ["-5"]);
    }

    #[test]
    fn test_repeated_key_extends_its_span() {
        let groups = vec![OptionGroup::new("").with_option(
            OptionNode::with_value(&["tag"], "").with_optional(OptionNode::flag(&["--quiet"], "")),
        )];
        let index = index_arguments(&["tag", "a", "tag", "b", "--quiet"], &groups);

        assert_eq!(index.positional("tag").unwrap(), ["a", "b"]);
    }

    #[test]
    fn test_flat_roundtrip_uses_args_key() {
        let mut flat = FlatIndex::new();
        flat.entry("cmd".into())
            .or_default()
            .insert(ARGS_KEY.into(), vec!["v".into()]);
        flat.entry("cmd".into())
            .or_default()
            .insert("--opt".into(), vec!["w".into()]);

        let index = IndexedArguments::from_flat(flat.clone());
        assert_eq!(index.positional("cmd").unwrap(), ["v"]);
        assert_eq!(index.named("cmd", "--opt").unwrap(), ["w"]);
        assert_eq!(index.to_flat(), flat);
    }
}
