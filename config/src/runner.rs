use std::path::Path;

use optree_core::{Application, Environment, Outcome};
use tracing::debug;

use crate::error::RunError;
use crate::loader::load_config;

/// Runs `app` against `arguments` (program path first) and `environment`,
/// with the config file at `config_path` as the lowest-precedence source.
///
/// # Errors
///
/// [`RunError::Config`] if the config file is malformed, otherwise any
/// resolution or action error as [`RunError::Resolve`].
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use optree_config::{load_definition, run};
///
/// let app = load_definition("app.yml").unwrap();
/// let args: Vec<String> = std::env::args().collect();
/// let env = std::env::vars().collect();
/// let outcome = run(&app, &args, &env, Some(Path::new(".apprc"))).unwrap();
/// if let Some(help) = outcome.help() {
///     println!("{help}");
/// }
/// ```
pub fn run<S: AsRef<str>>(
    app: &Application,
    arguments: &[S],
    environment: &Environment,
    config_path: Option<&Path>,
) -> Result<Outcome, RunError> {
    let config = load_config(config_path)?;
    debug!(has_config = config.is_some(), "Running application");
    Ok(app.run(arguments, environment, config.as_ref())?)
}
