//! Option tree definitions.
//!
//! An [`OptionNode`] is either a command (`install` in `brew install foo`) or a
//! flag (`-a` in `ls -a`). Nodes own their required and optional children, so a
//! whole command line grammar is declared as a tree of nodes grouped into
//! [`OptionGroup`]s. The types deserialize from YAML/JSON definition files;
//! actions are attached in code.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Boxed error returned by [`Command`] implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Reserved keys that route a run to help output.
///
/// These cannot be used as option keys; see
/// [`validate_declaration`](crate::validate_declaration).
pub const HELP_KEYS: [&str; 3] = ["--help", "help", "-h"];

/// Returns `true` if `token` is one of the reserved [`HELP_KEYS`].
pub fn is_help_key(token: &str) -> bool {
    HELP_KEYS.contains(&token)
}

/// Action invoked with a fully resolved option.
///
/// Any `Fn(&OptionNode) -> Result<(), BoxError>` closure implements this
/// trait.
///
/// # Examples
///
/// ```
/// use optree_core::{BoxError, Command, OptionNode};
///
/// let greet = |option: &OptionNode| -> Result<(), BoxError> {
///     println!("hello {:?}", option.values);
///     Ok(())
/// };
/// let node = OptionNode::with_value(&["greet"], "Say hello");
/// assert!(greet.execute(&node).is_ok());
/// ```
pub trait Command: Send + Sync {
    /// Runs the action for `option`, whose `values` are populated.
    fn execute(&self, option: &OptionNode) -> Result<(), BoxError>;
}

impl<F> Command for F
where
    F: Fn(&OptionNode) -> Result<(), BoxError> + Send + Sync,
{
    fn execute(&self, option: &OptionNode) -> Result<(), BoxError> {
        self(option)
    }
}

/// A command or flag in the option tree.
///
/// Equality compares `keys` only: two nodes with the same aliases are the
/// same option regardless of their description, children or values.
///
/// # Examples
///
/// ```
/// use optree_core::OptionNode;
///
/// let install = OptionNode::with_value(&["install"], "Install a formula")
///     .with_usage("brew install FORMULA [OPTIONS]")
///     .with_optional(OptionNode::flag(&["-d", "--debug"], "Debug output"));
///
/// assert!(install.matches("install"));
/// assert_eq!(install.all_keys(), vec!["install", "-d", "--debug"]);
/// assert!(install.values.is_none());
/// ```
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct OptionNode {
    /// Aliases identifying this option, e.g. `["-o", "--option"]`.
    pub keys: Vec<String>,
    /// Help text.
    #[serde(default)]
    pub description: String,
    /// Usage line shown in detailed help.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    /// Whether resolution fails when no value can be found.
    #[serde(default)]
    pub requires_value: bool,
    /// Fallback value used when no source supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Children that must be supplied whenever this option is.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_arguments: Vec<OptionNode>,
    /// Children that may be supplied.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_arguments: Vec<OptionNode>,
    /// Resolved values; `None` until resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(skip)]
    action: Option<Arc<dyn Command>>,
}

impl OptionNode {
    fn new(keys: &[&str], description: &str, requires_value: bool) -> Self {
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            description: description.to_string(),
            requires_value,
            ..Default::default()
        }
    }

    /// Creates an option that does not need a value (like `ls -a`).
    pub fn flag(keys: &[&str], description: &str) -> Self {
        Self::new(keys, description, false)
    }

    /// Creates an option that must resolve to at least one value.
    pub fn with_value(keys: &[&str], description: &str) -> Self {
        Self::new(keys, description, true)
    }

    /// Sets the usage line.
    pub fn with_usage(mut self, usage: &str) -> Self {
        self.usage = Some(usage.to_string());
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    /// Adds a required child.
    pub fn with_required(mut self, argument: OptionNode) -> Self {
        self.required_arguments.push(argument);
        self
    }

    /// Adds an optional child.
    pub fn with_optional(mut self, argument: OptionNode) -> Self {
        self.optional_arguments.push(argument);
        self
    }

    /// Attaches the action run after a successful resolution.
    pub fn with_action(mut self, action: impl Command + 'static) -> Self {
        self.action = Some(Arc::new(action));
        self
    }

    /// Adds a child in place.
    pub fn add_argument(&mut self, argument: OptionNode, required: bool) {
        if required {
            self.required_arguments.push(argument);
        } else {
            self.optional_arguments.push(argument);
        }
    }

    /// Returns the attached action, if any.
    pub fn action(&self) -> Option<&dyn Command> {
        self.action.as_deref()
    }

    /// Checks whether `key` is one of this option's own aliases.
    pub fn matches(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Iterates required children, then optional children.
    pub fn children(&self) -> impl Iterator<Item = &OptionNode> {
        self.required_arguments
            .iter()
            .chain(self.optional_arguments.iter())
    }

    /// Own keys followed by every descendant's keys, depth first.
    pub fn all_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.keys.iter().map(String::as_str).collect();
        for child in self.children() {
            keys.extend(child.all_keys());
        }
        keys
    }

    /// Own values followed by every descendant's values, depth first.
    pub fn all_values(&self) -> Vec<&str> {
        let mut values: Vec<&str> = self
            .values
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();
        for child in self.children() {
            values.extend(child.all_values());
        }
        values
    }
}

impl PartialEq for OptionNode {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys
    }
}

impl Eq for OptionNode {}

impl fmt::Debug for OptionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionNode")
            .field("keys", &self.keys)
            .field("description", &self.description)
            .field("usage", &self.usage)
            .field("requires_value", &self.requires_value)
            .field("default_value", &self.default_value)
            .field("required_arguments", &self.required_arguments)
            .field("optional_arguments", &self.optional_arguments)
            .field("values", &self.values)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

/// A titled set of root options, e.g. "Commands:" and "Troubleshooting:" in
/// `brew --help`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionGroup {
    /// Group heading shown in help output.
    pub description: String,
    /// Root options in declaration order.
    #[serde(default)]
    pub options: Vec<OptionNode>,
}

impl OptionGroup {
    /// Creates an empty group.
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            options: Vec::new(),
        }
    }

    /// Adds a root option.
    pub fn with_option(mut self, option: OptionNode) -> Self {
        self.options.push(option);
        self
    }
}

/// Every alias declared across `groups`, at any depth.
pub fn all_keys(groups: &[OptionGroup]) -> Vec<&str> {
    groups
        .iter()
        .flat_map(|group| group.options.iter())
        .flat_map(OptionNode::all_keys)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> OptionNode {
        OptionNode::with_value(&["test-command"], "Test a custom command")
            .with_optional(OptionNode::flag(&["-o", "--option"], "Some option").with_default("x"))
            .with_required(OptionNode::flag(&["-a", "--alternate-option"], "Alternate"))
    }

    #[test]
    fn test_all_keys_lists_required_before_optional() {
        let node = command();
        let keys = node.all_keys();
        assert_eq!(
            keys,
            vec!["test-command", "-a", "--alternate-option", "-o", "--option"]
        );
    }

    #[test]
    fn test_all_values_collects_descendants() {
        let mut node = command();
        node.values = Some(vec!["value".into()]);
        node.optional_arguments[0].values = Some(vec!["x".into()]);

        assert_eq!(node.all_values(), vec!["value", "x"]);
    }

    #[test]
    fn test_equality_is_by_keys() {
        let a = OptionNode::flag(&["-v", "--verbose"], "one");
        let b = OptionNode::with_value(&["-v", "--verbose"], "two").with_default("1");
        let c = OptionNode::flag(&["--verbose", "-v"], "one");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_add_argument_routes_by_requiredness() {
        let mut node = OptionNode::flag(&["cmd"], "");
        node.add_argument(OptionNode::flag(&["-r"], ""), true);
        node.add_argument(OptionNode::flag(&["-o"], ""), false);

        assert_eq!(node.required_arguments.len(), 1);
        assert_eq!(node.optional_arguments.len(), 1);
    }

    #[test]
    fn test_deserialize_definition_skips_action() {
        let json = r#"{
            "keys": ["build"],
            "description": "Build the project",
            "requires_value": true,
            "optional_arguments": [{"keys": ["-r", "--release"]}]
        }"#;
        let node: OptionNode = serde_json::from_str(json).unwrap();

        assert!(node.requires_value);
        assert!(node.action().is_none());
        assert_eq!(node.optional_arguments[0].keys, vec!["-r", "--release"]);
        assert!(!node.optional_arguments[0].requires_value);
    }

    #[test]
    fn test_help_keys() {
        assert!(is_help_key("-h"));
        assert!(is_help_key("help"));
        assert!(!is_help_key("--helpful"));
    }
}
