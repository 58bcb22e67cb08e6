//! Value resolution and unknown-key detection.
//!
//! Resolution reads each option's values from the consolidated
//! [`IndexedArguments`]; it never rescans raw tokens.

use tracing::debug;

use crate::error::{ResolveError, Result};
use crate::index::IndexedArguments;
use crate::types::OptionNode;

/// Looks up the values supplied for `node`.
///
/// Aliases are tried in declaration order, first as a command (its
/// positional slot), then as a child slot under any command. The first
/// non-empty list wins; if every match is empty the first match is
/// returned.
pub fn value_for_keys<'a>(node: &OptionNode, index: &'a IndexedArguments) -> Option<&'a [String]> {
    let mut first_match = None;
    for key in &node.keys {
        let Some(values) = index.positional(key).or_else(|| index.find_named(key)) else {
            continue;
        };
        if !values.is_empty() {
            return Some(values);
        }
        if first_match.is_none() {
            first_match = Some(values);
        }
    }
    first_match
}

/// Returns a copy of `node` (and all its children) with `values` populated.
///
/// Without a supplied value the default is used as a single value; failing
/// that, an option that does not require a value gets an empty list.
///
/// # Errors
///
/// [`ResolveError::MissingRequiredValue`] when `requires_value` is set and
/// neither a source nor a default provides a value, anywhere in the tree.
///
/// # Examples
///
/// ```
/// use optree_core::*;
///
/// let option = OptionNode::with_value(&["--level"], "Level").with_default("3");
/// let resolved = parse_values(&option, &IndexedArguments::new()).unwrap();
/// assert_eq!(resolved.values, Some(vec!["3".to_string()]));
///
/// let option = OptionNode::with_value(&["--name"], "Name");
/// assert!(parse_values(&option, &IndexedArguments::new()).is_err());
/// ```
pub fn parse_values(node: &OptionNode, index: &IndexedArguments) -> Result<OptionNode> {
    let mut copy = node.clone();

    copy.values = match value_for_keys(node, index) {
        Some(values) if !values.is_empty() => Some(values.to_vec()),
        _ => match &node.default_value {
            Some(default) => Some(vec![default.clone()]),
            None if !node.requires_value => Some(Vec::new()),
            None => {
                return Err(ResolveError::MissingRequiredValue {
                    keys: node.keys.clone(),
                });
            }
        },
    };

    copy.required_arguments = resolve_options(&node.required_arguments, index)?;
    copy.optional_arguments = resolve_options(&node.optional_arguments, index)?;

    Ok(copy)
}

/// Resolves every option in `options`.
pub fn resolve_options(options: &[OptionNode], index: &IndexedArguments) -> Result<Vec<OptionNode>> {
    options
        .iter()
        .map(|option| parse_values(option, index))
        .collect()
}

/// Returns the tokens that are neither a valid key nor a valid value.
///
/// The first token (the program path) is never reported.
///
/// # Examples
///
/// ```
/// use optree_core::detect_unknown;
///
/// let arguments = ["/path/to/app", "test-command", "value", "--foo-bar"];
/// let unknown = detect_unknown(&arguments, &["test-command"], &["value"]);
/// assert_eq!(unknown, vec!["--foo-bar"]);
/// ```
pub fn detect_unknown<S: AsRef<str>>(
    arguments: &[S],
    valid_keys: &[&str],
    valid_values: &[&str],
) -> Vec<String> {
    arguments
        .iter()
        .skip(1)
        .map(|token| token.as_ref())
        .filter(|token| !valid_keys.contains(token) && !valid_values.contains(token))
        .map(String::from)
        .collect()
}

/// Fails with [`ResolveError::UnknownKeys`] if `arguments` contain tokens
/// that none of the resolved `options` account for.
pub fn check_unknown<S: AsRef<str>>(arguments: &[S], options: &[OptionNode]) -> Result<()> {
    let keys: Vec<&str> = options.iter().flat_map(OptionNode::all_keys).collect();
    let values: Vec<&str> = options.iter().flat_map(OptionNode::all_values).collect();

    let unknown = detect_unknown(arguments, &keys, &values);
    if unknown.is_empty() {
        return Ok(());
    }
    debug!(unknown = ?unknown, "Found unknown keys");
    Err(ResolveError::UnknownKeys { keys: unknown })
}
