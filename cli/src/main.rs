use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use optree_config::{ConfigFormat, load_config, load_definition};
use optree_core::{Application, Environment, Outcome, consolidate};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "OPTREE_LOG";

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

impl From<CliOutputFormat> for ConfigFormat {
    fn from(fmt: CliOutputFormat) -> Self {
        match fmt {
            CliOutputFormat::Json => Self::Json,
            CliOutputFormat::Yaml => Self::Yaml,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "optree", version)]
#[command(about = "Resolve command lines against declared option trees")]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Log every resolution stage to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve arguments and print the options in use, or the help text.
    Resolve(ResolveArgs),
    /// Print the consolidated argument index as JSON.
    Index(IndexArgs),
    /// Print general help, or detailed help for one command.
    Help(HelpArgs),
    /// Check an option tree definition for declaration problems.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Option tree definition file (YAML, or JSON by extension).
    #[arg(long)]
    tree: PathBuf,
    /// Config file used as the lowest-precedence source.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Environment variable visible to the resolver, as KEY=VALUE.
    #[arg(
        long = "env",
        value_name = "KEY=VALUE",
        value_parser = parse_env_pair,
        allow_hyphen_values = true
    )]
    env: Vec<(String, String)>,
    /// Also pass the process environment (overridden by --env).
    ///
    /// Variables are flattened in name order and indexed like command-line
    /// tokens, so a variable named after a command takes every later
    /// variable name and value as its values, up to the next known key.
    #[arg(long, verbatim_doc_comment)]
    inherit_env: bool,
    /// Arguments to resolve, without the program path.
    #[arg(last = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct ResolveArgs {
    #[command(flatten)]
    sources: SourceArgs,
    /// Output format for resolved options.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct IndexArgs {
    #[command(flatten)]
    sources: SourceArgs,
}

#[derive(Debug, Args)]
struct HelpArgs {
    /// Option tree definition file.
    #[arg(long)]
    tree: PathBuf,
    /// Root command to show detailed help for.
    command: Option<String>,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Option tree definition file.
    #[arg(long)]
    tree: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Resolve(args) => run_resolve(args),
        Command::Index(args) => run_index(args),
        Command::Help(args) => run_help(args),
        Command::Check(args) => run_check(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn run_resolve(args: ResolveArgs) -> Result<(), String> {
    let app = load_tree(&args.sources.tree)?;
    let arguments = program_arguments(&app, &args.sources.args);
    let environment = build_environment(&args.sources);

    let outcome = optree_config::run(&app, &arguments, &environment, args.sources.config.as_deref())
        .map_err(|err| err.to_string())?;

    match outcome {
        Outcome::Help(text) => println!("{text}"),
        Outcome::Resolved(options) => {
            let format: ConfigFormat = args.format.into();
            let raw = format
                .render(&options)
                .map_err(|err| format!("Failed to serialize resolved options: {err}"))?;
            println!("{}", raw.trim_end());
        }
    }
    Ok(())
}

fn run_index(args: IndexArgs) -> Result<(), String> {
    let app = load_tree(&args.sources.tree)?;
    let environment = build_environment(&args.sources);
    let config = load_config(args.sources.config.as_deref())
        .map_err(|err| format!("Failed to load config: {err}"))?;

    let index = consolidate(&args.sources.args, &environment, config.as_ref(), &app.groups);
    let raw = serde_json::to_string_pretty(&index)
        .map_err(|err| format!("Failed to serialize index: {err}"))?;
    println!("{raw}");
    Ok(())
}

fn run_help(args: HelpArgs) -> Result<(), String> {
    let app = load_tree(&args.tree)?;

    let mut arguments = vec![app.name.clone()];
    if let Some(command) = args.command {
        arguments.push(command);
        arguments.push("--help".to_string());
        if app.parse_help_option(&arguments).is_none() {
            return Err(format!("No root command '{}' in '{}'", arguments[1], args.tree.display()));
        }
    }

    println!("{}", app.help_text(&arguments));
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let app = load_tree(&args.tree)?;

    let errors = app.validate_declaration();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(format!(
            "Invalid definition '{}': {}",
            args.tree.display(),
            messages.join("; ")
        ));
    }

    println!(
        "Checked '{}': {} root option(s) in {} group(s).",
        args.tree.display(),
        app.root_options().count(),
        app.groups.len()
    );
    Ok(())
}

fn load_tree(path: &Path) -> Result<Application, String> {
    load_definition(path).map_err(|err| format!("Failed to load '{}': {err}", path.display()))
}

/// Prepends the application name as the program path.
fn program_arguments(app: &Application, args: &[String]) -> Vec<String> {
    std::iter::once(app.name.clone())
        .chain(args.iter().cloned())
        .collect()
}

fn build_environment(sources: &SourceArgs) -> Environment {
    let mut environment = Environment::new();
    if sources.inherit_env {
        environment.extend(std::env::vars());
        warn!(
            variables = environment.len(),
            "Inheriting the process environment; a variable named after a command absorbs later variables as values"
        );
    }
    environment.extend(sources.env.iter().cloned());
    debug!(variables = environment.len(), "Assembled environment");
    environment
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
