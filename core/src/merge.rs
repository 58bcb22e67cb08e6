//! Multi-source consolidation.
//!
//! Arguments can come from a config file, the environment and the command
//! line. [`consolidate`] indexes the environment and CLI tokens, layers the
//! three indexes with [`merge_indexes`] (config < environment < CLI) and then
//! drops commands the current invocation never mentioned.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use optree_core::*;
//!
//! let groups = vec![OptionGroup::new("Commands:").with_option(
//!     OptionNode::with_value(&["deploy"], "Deploy")
//!         .with_optional(OptionNode::with_value(&["--region"], "Region")),
//! )];
//!
//! let mut config = IndexedArguments::new();
//! config.insert("deploy", ArgSlot::Named("--region".into()), vec!["eu".into()]);
//!
//! let env = BTreeMap::new();
//! let merged = consolidate(&["deploy", "prod"], &env, Some(&config), &groups);
//! assert_eq!(merged.positional("deploy").unwrap(), ["prod"]);
//! assert_eq!(merged.named("deploy", "--region").unwrap(), ["eu"]);
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use crate::index::{IndexedArguments, index_arguments};
use crate::types::OptionGroup;

/// Environment variables by name.
pub type Environment = BTreeMap<String, String>;

/// Layers `overlay` on top of `base`.
///
/// The update is deep: for each command in `overlay`, only the slots it
/// carries are replaced, so other slots of the same command in `base`
/// survive. An empty value list in `overlay` does not erase a non-empty list
/// in `base`.
///
/// # Examples
///
/// ```
/// use optree_core::*;
///
/// let mut base = IndexedArguments::new();
/// base.insert("cmd", ArgSlot::Positional, vec!["base".into()]);
/// base.insert("cmd", ArgSlot::Named("-o".into()), vec!["kept".into()]);
///
/// let mut overlay = IndexedArguments::new();
/// overlay.insert("cmd", ArgSlot::Positional, vec!["overlay".into()]);
///
/// let merged = merge_indexes(&base, &overlay);
/// assert_eq!(merged.positional("cmd").unwrap(), ["overlay"]);
/// assert_eq!(merged.named("cmd", "-o").unwrap(), ["kept"]);
/// ```
pub fn merge_indexes(base: &IndexedArguments, overlay: &IndexedArguments) -> IndexedArguments {
    let mut merged = base.clone();

    for (command, entry) in overlay.iter() {
        let target = merged.entry_mut(command);
        for (slot, values) in entry {
            match target.get(slot) {
                Some(existing) if values.is_empty() && !existing.is_empty() => {}
                _ => {
                    target.insert(slot.clone(), values.clone());
                }
            }
        }
    }

    merged
}

/// Flattens environment pairs into `[key, value, key, value, ...]`, sorted by
/// key, so they can be indexed like CLI tokens.
pub fn flatten_environment(environment: &Environment) -> Vec<String> {
    environment
        .iter()
        .flat_map(|(key, value)| [key.clone(), value.clone()])
        .collect()
}

/// Merges the config, environment and CLI sources.
///
/// `cli_args` excludes the program path. Environment variable names are
/// matched against declared keys literally. After merging, only commands
/// whose key appears verbatim among the environment names or the CLI tokens
/// are kept, so a config file cannot activate a command on its own.
pub fn consolidate<S: AsRef<str>>(
    cli_args: &[S],
    environment: &Environment,
    config: Option<&IndexedArguments>,
    groups: &[OptionGroup],
) -> IndexedArguments {
    let cli = index_arguments(cli_args, groups);
    let env = index_arguments(&flatten_environment(environment), groups);
    let base = config.cloned().unwrap_or_default();

    let mut merged = merge_indexes(&merge_indexes(&base, &env), &cli);
    merged.retain_commands(|command| {
        environment.contains_key(command) || cli_args.iter().any(|token| token.as_ref() == command)
    });

    debug!(
        config_commands = base.len(),
        env_commands = env.len(),
        cli_commands = cli.len(),
        commands = ?merged.commands().collect::<Vec<_>>(),
        "Consolidated argument sources"
    );
    merged
}
