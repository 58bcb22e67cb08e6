//! Option tree validation.
//!
//! Two passes live here:
//!
//! - [`validate_keys`] walks a declared tree against an
//!   [`IndexedArguments`] map, pruning optional branches the user did not
//!   supply and failing when a supplied option is missing a required child.
//! - [`validate_declaration`] checks the declared tree itself (empty key
//!   lists, reserved help keys, duplicate sibling keys) before it is used.
//!
//! # Examples
//!
//! ```
//! use optree_core::*;
//!
//! let command = OptionNode::with_value(&["test-command"], "Test")
//!     .with_required(OptionNode::flag(&["-a", "--alternate-option"], "Alternate"));
//!
//! let groups = vec![OptionGroup::new("Commands:").with_option(command.clone())];
//! let index = index_arguments(&["test-command"], &groups);
//!
//! let err = validate_keys(&command, &index).unwrap_err();
//! assert!(matches!(err, ResolveError::MissingRequiredArgument { .. }));
//! assert_eq!(err.keys(), ["-a", "--alternate-option"]);
//! ```

use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::error::{ResolveError, Result};
use crate::index::{IndexedArguments, strip_dash_prefix};
use crate::types::{OptionGroup, OptionNode, is_help_key};

/// Keys of `node` that occur in `index`, either as a command or as a child
/// slot under any command. Help keys never count.
fn found_keys<'a>(node: &'a OptionNode, index: &IndexedArguments) -> Vec<&'a str> {
    node.keys
        .iter()
        .map(String::as_str)
        .filter(|key| !is_help_key(key))
        .filter(|key| index.contains_command(key) || index.contains_named(key))
        .collect()
}

fn wants_help(found: &[&str], index: &IndexedArguments) -> bool {
    found.iter().any(|key| {
        index
            .positional(key)
            .is_some_and(|values| values.iter().any(|v| is_help_key(v)))
    })
}

/// Copy of `node` whose children are limited to the ones that validate.
fn prune_children(node: &OptionNode, index: &IndexedArguments) -> Result<OptionNode> {
    let mut copy = node.clone();
    copy.required_arguments = validate_all(&node.required_arguments, index)?;
    copy.optional_arguments = validate_all(&node.optional_arguments, index)?;
    Ok(copy)
}

fn validate_all(nodes: &[OptionNode], index: &IndexedArguments) -> Result<Vec<OptionNode>> {
    let mut kept = Vec::with_capacity(nodes.len());
    for node in nodes {
        if let Some(validated) = validate_keys(node, index)? {
            kept.push(validated);
        }
    }
    Ok(kept)
}

/// Validates `node` against `index`.
///
/// Returns `Ok(None)` when the option was not supplied and has no default
/// value (or when help was requested for it), so the caller can drop it.
/// Otherwise returns a copy whose optional children are limited to those
/// that validate. A supplied option whose required child is absent and has
/// no default fails with [`ResolveError::MissingRequiredArgument`].
///
/// Validating the returned copy again yields the same tree.
pub fn validate_keys(node: &OptionNode, index: &IndexedArguments) -> Result<Option<OptionNode>> {
    let found = found_keys(node, index);

    if wants_help(&found, index) {
        debug!(keys = ?node.keys, "Help requested for option");
        return Ok(None);
    }

    if found.is_empty() {
        if node.default_value.is_none() {
            return Ok(None);
        }
        // Not supplied, but present through its default. Nothing is required
        // of an option the user never mentioned.
        return prune_children(node, index).map(Some);
    }

    let mut copy = node.clone();
    copy.required_arguments = Vec::with_capacity(node.required_arguments.len());
    for required in &node.required_arguments {
        match validate_keys(required, index)? {
            Some(validated) => copy.required_arguments.push(validated),
            None if required.default_value.is_some() => copy.required_arguments.push(required.clone()),
            None => {
                return Err(ResolveError::MissingRequiredArgument {
                    keys: required.keys.clone(),
                });
            }
        }
    }
    copy.optional_arguments = validate_all(&node.optional_arguments, index)?;

    if copy.optional_arguments.len() != node.optional_arguments.len() {
        debug!(
            keys = ?node.keys,
            kept = copy.optional_arguments.len(),
            declared = node.optional_arguments.len(),
            "Pruned unused optional arguments"
        );
    }
    Ok(Some(copy))
}

/// Validates every root option in `groups`, keeping the ones in use in
/// declaration order.
pub fn validate_groups(groups: &[OptionGroup], index: &IndexedArguments) -> Result<Vec<OptionNode>> {
    let roots: Vec<OptionNode> = groups
        .iter()
        .flat_map(|group| group.options.iter().cloned())
        .collect();
    validate_all(&roots, index)
}

/// Problems in a declared option tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    /// An option has no keys. Carries the path of its parent.
    #[error("option under '{0}' has no keys")]
    EmptyKeys(String),
    /// A key is empty once its dashes are stripped (e.g. `"-"`).
    #[error("invalid option key: {0:?}")]
    InvalidKey(String),
    /// A key collides with one of the reserved help keys.
    #[error("reserved help key used as option key: {0}")]
    ReservedHelpKey(String),
    /// Two siblings (or two root options) share a key.
    #[error("duplicate key in scope: {0}")]
    DuplicateKey(String),
}

/// Checks the declared tree for structural problems.
///
/// Stops at the first problem found.
///
/// # Examples
///
/// ```
/// use optree_core::*;
///
/// let good = vec![OptionGroup::new("Commands:")
///     .with_option(OptionNode::flag(&["build"], "Build"))];
/// assert!(validate_declaration(&good).is_empty());
///
/// let bad = vec![OptionGroup::new("Commands:")
///     .with_option(OptionNode::flag(&["-h", "--host"], "Host"))];
/// assert_eq!(
///     validate_declaration(&bad),
///     vec![DeclarationError::ReservedHelpKey("-h".into())]
/// );
/// ```
pub fn validate_declaration(groups: &[OptionGroup]) -> Vec<DeclarationError> {
    let roots: Vec<&OptionNode> = groups.iter().flat_map(|group| group.options.iter()).collect();
    let mut path = Vec::new();
    validate_siblings(&roots, &mut path)
}

fn validate_siblings(nodes: &[&OptionNode], path: &mut Vec<String>) -> Vec<DeclarationError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for node in nodes {
        if node.keys.is_empty() {
            let location = if path.is_empty() {
                "<root>".to_string()
            } else {
                path.join(" ")
            };
            errors.push(DeclarationError::EmptyKeys(location));
            return errors;
        }

        for key in &node.keys {
            if strip_dash_prefix(key).is_empty() {
                errors.push(DeclarationError::InvalidKey(key.clone()));
                return errors;
            }
            if is_help_key(key) {
                errors.push(DeclarationError::ReservedHelpKey(key.clone()));
                return errors;
            }
            if !seen.insert(key) {
                errors.push(DeclarationError::DuplicateKey(key.clone()));
                return errors;
            }
        }

        let children: Vec<&OptionNode> = node.children().collect();
        path.push(node.keys[0].clone());
        errors.extend(validate_siblings(&children, path));
        path.pop();
        if !errors.is_empty() {
            return errors;
        }
    }

    errors
}
