//! Option trees, multi-source argument consolidation and value resolution.
//!
//! This crate resolves a command line against a declared tree of options:
//!
//! - [`OptionNode`]: a command or flag with aliases, a default value and
//!   required/optional children of any depth.
//! - [`OptionGroup`]: a titled set of root options.
//! - [`IndexedArguments`]: which keys were supplied, and their raw values,
//!   built by [`index_arguments`].
//! - [`Application`]: ties the groups to a name and help texts, and runs
//!   the whole pipeline.
//!
//! Arguments come from three sources merged by [`consolidate`] with
//! increasing precedence: a config file, the environment, then the command
//! line. [`validate_groups`] keeps the options in use and enforces required
//! children; [`parse_values`] fills in values; [`check_unknown`] rejects
//! tokens no option accounts for. Help is rendered with [`help_string`].
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use optree_core::*;
//!
//! let app = Application::new("app").with_group(
//!     OptionGroup::new("Commands:").with_option(
//!         OptionNode::with_value(&["test-command"], "Test a custom command")
//!             .with_optional(OptionNode::flag(&["-o", "--option"], "Some option"))
//!             .with_required(OptionNode::flag(&["-a", "--alternate-option"], "Alternate")),
//!     ),
//! );
//!
//! let env = BTreeMap::new();
//! let outcome = app.run(&["/path/to/app", "test-command", "value", "-o", "-a"], &env, None);
//! assert!(outcome.unwrap().options().is_some());
//!
//! let err = app.run(&["/path/to/app", "test-command"], &env, None).unwrap_err();
//! assert_eq!(err.to_string(), r#"You didn't provide: ["-a", "--alternate-option"]"#);
//! ```

mod app;
mod error;
mod help;
mod index;
mod merge;
mod resolve;
mod types;
mod validate;

pub use app::{Application, Outcome};
pub use error::{ErrorKind, ResolveError, Result};
pub use help::{HelpEntry, help_string};
pub use index::{
    ARGS_KEY, ArgSlot, CommandEntry, FlatIndex, IndexedArguments, index_arguments, index_option,
    strip_dash_prefix, value_span,
};
pub use merge::{Environment, consolidate, flatten_environment, merge_indexes};
pub use resolve::{check_unknown, detect_unknown, parse_values, resolve_options, value_for_keys};
pub use types::*;
pub use validate::{DeclarationError, validate_declaration, validate_groups, validate_keys};
