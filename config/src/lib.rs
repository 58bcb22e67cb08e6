//! Config files and option-tree definitions for `optree-core`.
//!
//! This crate reads the file-based inputs of a run:
//!
//! - config files ([`load_config`]), the lowest-precedence argument source,
//!   decoded into an [`IndexedArguments`](optree_core::IndexedArguments);
//! - definition files ([`load_definition`]), which declare an
//!   [`Application`](optree_core::Application) and its option groups.
//!
//! Both accept YAML, or JSON when the file name ends in `.json`.
//! [`run`] ties a definition, the process arguments and environment, and a
//! config path together.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use optree_config::{load_definition, run};
//! use optree_core::{BoxError, OptionNode};
//!
//! let mut app = load_definition("tool.yml").unwrap();
//! app.attach_action("deploy", |option: &OptionNode| -> Result<(), BoxError> {
//!     println!("deploying {:?}", option.values);
//!     Ok(())
//! });
//!
//! let args: Vec<String> = std::env::args().collect();
//! let env = std::env::vars().collect();
//! run(&app, &args, &env, Some(Path::new(".toolrc.yml"))).unwrap();
//! ```

mod error;
mod format;
mod loader;
mod runner;

pub use error::{ConfigError, Result, RunError};
pub use format::ConfigFormat;
pub use loader::{decode_config, load_config, load_definition};
pub use runner::run;
