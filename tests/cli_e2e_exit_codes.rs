//! End-to-end tests for CLI exit codes.
//!
//! - Exit code 0: Success
//! - Exit code 1: Command error (configuration, resolution, publishing)
//! - Exit code 2: Invalid command-line usage (handled by clap)

#[allow(dead_code)]
mod common;
use common::prelude::*;

/// Exit code 0 is returned for successful operations.
#[test]
fn test_exit_code_success() {
    let fixture = TestFixture::new().with_config("docs_root: docs\n");

    fixture
        .command()
        .arg("validate")
        .arg("--config")
        .arg(fixture.config_path())
        .assert()
        .code(0);
}

/// Exit code 0 is returned for --help.
#[test]
fn test_exit_code_help() {
    let mut cmd = cargo_bin_cmd!("fixdoc");

    cmd.arg("--help").assert().code(0);
}

/// Exit code 0 is returned for --version.
#[test]
fn test_exit_code_version() {
    let mut cmd = cargo_bin_cmd!("fixdoc");

    cmd.arg("--version")
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("fixdoc "));
}

/// Exit code 1 is returned for a configuration file that does not exist.
#[test]
fn test_exit_code_error_config_not_found() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .arg("validate")
        .arg("--config")
        .arg("nonexistent.yaml")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found"));
}

/// Exit code 1 is returned for invalid YAML syntax.
#[test]
fn test_exit_code_error_invalid_yaml() {
    let fixture = TestFixture::new().with_config(configs::INVALID_YAML);

    fixture
        .command()
        .arg("validate")
        .assert()
        .code(1);
}

/// Exit code 1 is returned when the document repository is missing.
#[test]
fn test_exit_code_error_missing_repository() {
    let fixture = TestFixture::new().with_config(configs::MINIMAL);

    fixture
        .command()
        .args(["locate", "/widgets/button"])
        .assert()
        .code(1);
}

/// Exit code 2 is returned for unknown command-line flags.
#[test]
fn test_exit_code_usage_unknown_flag() {
    let mut cmd = cargo_bin_cmd!("fixdoc");

    cmd.arg("--unknown-flag-that-does-not-exist")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error:"));
}

/// Exit code 2 is returned for unknown subcommand.
#[test]
fn test_exit_code_usage_unknown_subcommand() {
    let mut cmd = cargo_bin_cmd!("fixdoc");

    cmd.arg("unknown-subcommand-xyz")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error:"));
}

/// Exit code 2 is returned when required arguments are missing.
#[test]
fn test_exit_code_usage_missing_required_arg() {
    let mut cmd = cargo_bin_cmd!("fixdoc");

    // 'locate' requires a PATH argument
    cmd.arg("locate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("required"));
}

/// Exit code 2 is returned for invalid argument values.
#[test]
fn test_exit_code_usage_invalid_arg_value() {
    let mut cmd = cargo_bin_cmd!("fixdoc");

    cmd.args(["serve", "--bind", "not-an-address"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

/// Subcommand help returns exit code 0.
#[test]
fn test_exit_code_subcommand_help() {
    let mut cmd = cargo_bin_cmd!("fixdoc");

    cmd.args(["fix", "--help"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("--dry-run"));
}
