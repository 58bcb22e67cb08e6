//! Integration tests for the optree-config crate.

use std::fs;
use std::path::{Path, PathBuf};

use optree_config::{ConfigError, RunError, load_config, load_definition, run};
use optree_core::{Environment, ErrorKind, ResolveError};

const DEFINITION_YAML: &str = r#"
name: Test App
description: My app's description
usage: app COMMAND [OPTIONS]
groups:
  - description: "Commands Group:"
    options:
      - keys: [test-command]
        description: Test a custom command
        usage: app test-command [OPTIONS]
        requires_value: true
        optional_arguments:
          - keys: ["-o", "--option"]
            description: Some Option
            default_value: default_value
        required_arguments:
          - keys: ["-a", "--alternate-option"]
            description: Alternate Option
      - keys: [next-command]
        description: Test another command
        required_arguments:
          - keys: ["-r", "--required"]
            description: Required Option
            requires_value: true
"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("failed to write fixture");
    path
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

#[test]
fn test_load_yaml_definition() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "app.yml", DEFINITION_YAML);

    let app = load_definition(&path).unwrap();
    assert_eq!(app.name, "Test App");
    assert_eq!(app.groups.len(), 1);

    let command = &app.groups[0].options[0];
    assert!(command.requires_value);
    assert_eq!(command.required_arguments[0].keys, ["-a", "--alternate-option"]);
    assert_eq!(command.optional_arguments[0].default_value.as_deref(), Some("default_value"));
    assert!(app.validate_declaration().is_empty());
}

#[test]
fn test_load_json_definition() {
    let dir = tempfile::tempdir().unwrap();
    let json = r#"{
        "name": "tool",
        "groups": [{"description": "Commands:", "options": [{"keys": ["status"]}]}]
    }"#;
    let path = write(dir.path(), "tool.json", json);

    let app = load_definition(&path).unwrap();
    assert_eq!(app.name, "tool");
    assert!(app.description.is_none());
    assert_eq!(app.groups[0].options[0].keys, ["status"]);
}

#[test]
fn test_missing_definition_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_definition(dir.path().join("nope.yml")).unwrap_err();
    assert!(matches!(err, ConfigError::IoError(_)));
}

// ---------------------------------------------------------------------------
// Config files
// ---------------------------------------------------------------------------

#[test]
fn test_load_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        ".apprc",
        "test-command:\n  args: [value]\n  --option: true\nnext-command:\n  --required: true\n",
    );

    let index = load_config(Some(path.as_path())).unwrap().unwrap();
    assert_eq!(index.len(), 2);
    assert_eq!(index.positional("test-command").unwrap(), ["value"]);
    assert_eq!(index.named("next-command", "--required").unwrap(), ["true"]);
}

#[test]
fn test_empty_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "empty.yml", "");
    assert!(load_config(Some(path.as_path())).unwrap().is_none());
}

#[test]
fn test_malformed_json_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "bad.json", "{\"test-command\": [");
    let err = load_config(Some(path.as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::JsonError(_)));
}

// ---------------------------------------------------------------------------
// Running
// ---------------------------------------------------------------------------

#[test]
fn test_run_with_yaml_config() {
    let dir = tempfile::tempdir().unwrap();
    let app = load_definition(write(dir.path(), "app.yml", DEFINITION_YAML)).unwrap();
    let config = write(
        dir.path(),
        "config.yml",
        "test-command:\n  args: [value]\n  --option: true\nnext-command:\n  --required: true\n",
    );

    let outcome = run(
        &app,
        &["/path/to/app", "test-command", "--alternate-option"],
        &Environment::new(),
        Some(config.as_path()),
    )
    .unwrap();

    let options = outcome.options().unwrap();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].keys, ["test-command"]);
    assert_eq!(options[0].values.as_deref().unwrap(), ["value"]);
}

#[test]
fn test_run_precedence_with_all_sources() {
    let dir = tempfile::tempdir().unwrap();
    let app = load_definition(write(dir.path(), "app.yml", DEFINITION_YAML)).unwrap();
    let config = write(
        dir.path(),
        "config.json",
        r#"{"test-command": {"args": ["v-json"], "-o": "o-json"}}"#,
    );
    // `-o` alone in the environment has no command to attach to.
    let env: Environment = [("-o".to_string(), "o-env".to_string())].into_iter().collect();

    let outcome = run(
        &app,
        &["/path/to/app", "test-command", "-a"],
        &env,
        Some(config.as_path()),
    )
    .unwrap();

    let command = &outcome.options().unwrap()[0];
    assert_eq!(command.values.as_deref().unwrap(), ["v-json"]);
    assert_eq!(command.optional_arguments[0].values.as_deref().unwrap(), ["o-json"]);
}

#[test]
fn test_run_surfaces_resolution_errors() {
    let dir = tempfile::tempdir().unwrap();
    let app = load_definition(write(dir.path(), "app.yml", DEFINITION_YAML)).unwrap();

    let err = run(&app, &["/path/to/app", "test-command"], &Environment::new(), None).unwrap_err();
    let RunError::Resolve(err) = err else {
        panic!("expected a resolution error");
    };
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    assert!(matches!(err, ResolveError::MissingRequiredArgument { .. }));
}

#[test]
fn test_run_surfaces_config_errors() {
    let dir = tempfile::tempdir().unwrap();
    let app = load_definition(write(dir.path(), "app.yml", DEFINITION_YAML)).unwrap();
    let config = write(dir.path(), "config.yml", "test-command: [unclosed\n");

    let err = run(&app, &["/path/to/app", "test-command"], &Environment::new(), Some(config.as_path()))
        .unwrap_err();
    assert!(matches!(err, RunError::Config(ConfigError::YamlError(_))));
}
