//! Application definition and the resolve/dispatch entry points.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ResolveError, Result};
use crate::help::{HelpEntry, help_string};
use crate::index::IndexedArguments;
use crate::merge::{Environment, consolidate};
use crate::resolve::{check_unknown, resolve_options};
use crate::types::{Command, HELP_KEYS, OptionGroup, OptionNode, is_help_key};
use crate::validate::{DeclarationError, validate_declaration, validate_groups};

/// A command line application: its name, help texts and option groups.
///
/// Definitions can be written in code or deserialized from YAML/JSON; actions
/// are attached afterwards with [`Application::attach_action`].
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use optree_core::*;
///
/// let app = Application::new("app").with_group(
///     OptionGroup::new("Commands:").with_option(
///         OptionNode::with_value(&["greet"], "Say hello")
///             .with_optional(OptionNode::flag(&["-l", "--loud"], "Shout")),
///     ),
/// );
///
/// let outcome = app
///     .resolve(&["/usr/bin/app", "greet", "world", "--loud"], &BTreeMap::new(), None)
///     .unwrap();
/// let Outcome::Resolved(options) = outcome else { panic!("expected options") };
/// assert_eq!(options[0].values.as_deref().unwrap(), ["world"]);
/// assert_eq!(options[0].optional_arguments[0].keys, ["-l", "--loud"]);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Application {
    /// Program name used in the help footer.
    pub name: String,
    /// Description printed first in general help.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Usage line printed in general help.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,
    /// Root options, grouped for help output.
    #[serde(default)]
    pub groups: Vec<OptionGroup>,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Help was requested or nothing usable was supplied.
    Help(String),
    /// Root options in use, with values resolved.
    Resolved(Vec<OptionNode>),
}

impl Outcome {
    /// Returns the help text, if this outcome is help.
    pub fn help(&self) -> Option<&str> {
        match self {
            Self::Help(text) => Some(text),
            Self::Resolved(_) => None,
        }
    }

    /// Returns the resolved options, if any.
    pub fn options(&self) -> Option<&[OptionNode]> {
        match self {
            Self::Help(_) => None,
            Self::Resolved(options) => Some(options),
        }
    }
}

impl Application {
    /// Creates an application with no groups.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Sets the usage line.
    pub fn with_usage(mut self, usage: &str) -> Self {
        self.usage = Some(usage.to_string());
        self
    }

    /// Adds an option group.
    pub fn with_group(mut self, group: OptionGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Root options across all groups, in declaration order.
    pub fn root_options(&self) -> impl Iterator<Item = &OptionNode> {
        self.groups.iter().flat_map(|group| group.options.iter())
    }

    /// Attaches `action` to the first root option with alias `key`.
    ///
    /// Returns `false` if no root option has that alias.
    pub fn attach_action(&mut self, key: &str, action: impl Command + 'static) -> bool {
        let Some(option) = self
            .groups
            .iter_mut()
            .flat_map(|group| group.options.iter_mut())
            .find(|option| option.matches(key))
        else {
            return false;
        };
        let declared = std::mem::take(option);
        *option = declared.with_action(action);
        true
    }

    /// Checks the declared tree for problems.
    pub fn validate_declaration(&self) -> Vec<DeclarationError> {
        validate_declaration(&self.groups)
    }

    /// Entries for general help: description, usage, groups and a footer.
    pub fn help_entries(&self) -> Vec<HelpEntry> {
        let mut entries = Vec::new();
        if let Some(description) = &self.description {
            entries.push(HelpEntry::text(format!("{description}\n")));
        }
        if let Some(usage) = &self.usage {
            entries.push(HelpEntry::text(format!("Usage: {usage}\n")));
        }
        entries.extend(self.groups.iter().map(HelpEntry::from_group));
        entries.push(HelpEntry::text(format!(
            "\nRun `{} COMMAND ({})` for more information on a command.",
            self.name,
            HELP_KEYS.join(" or ")
        )));
        entries
    }

    /// Entries for help on a single option: its usage, then the option with
    /// its required and optional children.
    pub fn detailed_help_entries(&self, option: &OptionNode) -> Vec<HelpEntry> {
        let mut entries = Vec::new();
        if let Some(usage) = &option.usage {
            entries.push(HelpEntry::text(format!("Usage: {usage}\n")));
        }
        entries.push(HelpEntry::from_option(option, true));
        entries
    }

    /// Finds the root option help was requested for.
    ///
    /// Matches only `[program, command, help-key]` exactly.
    pub fn parse_help_option<S: AsRef<str>>(&self, arguments: &[S]) -> Option<&OptionNode> {
        let [_, command, last] = arguments else {
            return None;
        };
        if !is_help_key(last.as_ref()) {
            return None;
        }
        self.root_options()
            .find(|option| option.matches(command.as_ref()))
    }

    /// Renders detailed help when `arguments` ask for it, general help
    /// otherwise.
    pub fn help_text<S: AsRef<str>>(&self, arguments: &[S]) -> String {
        match self.parse_help_option(arguments) {
            Some(option) => help_string(&self.detailed_help_entries(option)),
            None => help_string(&self.help_entries()),
        }
    }

    /// Consolidates all sources, validates and resolves values.
    ///
    /// `arguments` starts with the program path. Returns
    /// [`Outcome::Help`] when no option is in use, when the last argument is
    /// a help key, or when only the program path was given.
    ///
    /// # Errors
    ///
    /// Any [`ResolveError`] except [`ResolveError::Action`].
    pub fn resolve<S: AsRef<str>>(
        &self,
        arguments: &[S],
        environment: &Environment,
        config: Option<&IndexedArguments>,
    ) -> Result<Outcome> {
        self.resolve_inner(arguments, environment, config)
            .inspect_err(|err| debug!(stage = "failed", kind = ?err.kind(), "Resolution failed"))
    }

    fn resolve_inner<S: AsRef<str>>(
        &self,
        arguments: &[S],
        environment: &Environment,
        config: Option<&IndexedArguments>,
    ) -> Result<Outcome> {
        let cli_args = arguments.get(1..).unwrap_or(&[]);
        let index = consolidate(cli_args, environment, config, &self.groups);
        debug!(stage = "consolidated", commands = index.len(), "Sources consolidated");

        let validated = validate_groups(&self.groups, &index)?;
        debug!(
            stage = "validated",
            options = ?validated.iter().map(|o| o.keys.as_slice()).collect::<Vec<_>>(),
            "Options validated"
        );

        let last = arguments.last().map(|token| token.as_ref());
        let first = arguments.first().map(|token| token.as_ref());
        let help_requested = last.is_some_and(is_help_key);

        if validated.is_empty() || help_requested || last == first {
            debug!(stage = "help_requested", "Rendering help");
            return Ok(Outcome::Help(self.help_text(arguments)));
        }

        let resolved = resolve_options(&validated, &index)?;
        check_unknown(arguments, &resolved)?;
        debug!(stage = "resolved", options = resolved.len(), "Values resolved");

        Ok(Outcome::Resolved(resolved))
    }

    /// Resolves `arguments` and invokes the action of every root option in
    /// use, in declaration order.
    ///
    /// Nothing is dispatched unless resolution succeeds as a whole.
    ///
    /// # Errors
    ///
    /// Resolution errors, or [`ResolveError::Action`] for the first action
    /// that fails. Later actions are not invoked.
    pub fn run<S: AsRef<str>>(
        &self,
        arguments: &[S],
        environment: &Environment,
        config: Option<&IndexedArguments>,
    ) -> Result<Outcome> {
        let outcome = self.resolve(arguments, environment, config)?;
        let Outcome::Resolved(options) = &outcome else {
            return Ok(outcome);
        };

        for option in options {
            let Some(action) = option.action() else {
                continue;
            };
            action.execute(option).map_err(|source| {
                debug!(stage = "failed", keys = ?option.keys, "Action failed");
                ResolveError::Action {
                    keys: option.keys.clone(),
                    source,
                }
            })?;
        }
        debug!(stage = "dispatched", options = options.len(), "Actions dispatched");

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::types::BoxError;

    use super::*;

    fn app() -> Application {
        Application::new("app")
            .with_description("Test application")
            .with_usage("app COMMAND [OPTIONS]")
            .with_group(
                OptionGroup::new("Commands:").with_option(
                    OptionNode::with_value(&["test-command"], "Test a custom command")
                        .with_usage("app test-command VALUE -a [-o]")
                        .with_optional(OptionNode::flag(&["-o", "--option"], "Some option"))
                        .with_required(OptionNode::flag(&["-a", "--alternate-option"], "Alternate")),
                ),
            )
    }

    #[test]
    fn test_parse_help_option_requires_three_tokens() {
        let app = app();
        assert!(app.parse_help_option(&["/app", "test-command", "help"]).is_some());
        assert!(app.parse_help_option(&["/app", "test-command", "-h"]).is_some());
        assert!(app.parse_help_option(&["/app", "test-command", "x", "-h"]).is_none());
        assert!(app.parse_help_option(&["/app", "test-command", "value"]).is_none());
        assert!(app.parse_help_option(&["/app", "unknown", "--help"]).is_none());
    }

    #[test]
    fn test_general_help_layout() {
        let help = app().help_text(&["/app"]);
        let expected = "Test application\n\n\
                        Usage: app COMMAND [OPTIONS]\n\n\
                        Commands:\n\
                        test-command    Test a custom command\n\
                        \nRun `app COMMAND (--help or help or -h)` for more information on a command.";
        assert_eq!(help, expected);
    }

    #[test]
    fn test_detailed_help_lists_children() {
        let help = app().help_text(&["/app", "test-command", "--help"]);

        assert!(help.starts_with("Usage: app test-command VALUE -a [-o]\n"));
        assert!(help.contains("-a, --alternate-option    Alternate"));
        assert!(help.contains("-o, --option              Some option"));
    }

    #[test]
    fn test_only_program_path_renders_help() {
        let outcome = app().resolve(&["/app"], &Environment::new(), None).unwrap();
        assert!(outcome.help().is_some());
    }

    #[test]
    fn test_attach_action_and_dispatch() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&calls);

        let mut app = app();
        assert!(app.attach_action("test-command", move |option: &OptionNode| -> std::result::Result<(), BoxError> {
            seen.lock().unwrap().push(option.values.clone().unwrap_or_default());
            Ok(())
        }));
        assert!(!app.attach_action("missing", |_: &OptionNode| -> std::result::Result<(), BoxError> { Ok(()) }));

        let outcome = app
            .run(&["/app", "test-command", "value", "-a"], &Environment::new(), None)
            .unwrap();

        assert!(outcome.options().is_some());
        assert_eq!(*calls.lock().unwrap(), vec![vec!["value".to_string()]]);
    }

    #[test]
    fn test_action_error_is_wrapped() {
        let mut app = app();
        app.attach_action("test-command", |_: &OptionNode| -> std::result::Result<(), BoxError> {
            Err("disk full".into())
        });

        let err = app
            .run(&["/app", "test-command", "value", "-a"], &Environment::new(), None)
            .unwrap_err();
        assert!(matches!(err, ResolveError::Action { .. }));
        assert_eq!(err.keys(), ["test-command"]);
    }

    #[test]
    fn test_failure_skips_dispatch() {
        let called = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&called);

        let mut app = app();
        app.attach_action("test-command", move |_: &OptionNode| -> std::result::Result<(), BoxError> {
            *flag.lock().unwrap() = true;
            Ok(())
        });

        let err = app
            .run(&["/app", "--foo-bar", "test-command", "value", "-a"], &Environment::new(), None)
            .unwrap_err();
        assert_eq!(err.keys(), ["--foo-bar"]);
        assert!(!*called.lock().unwrap());
    }
}
