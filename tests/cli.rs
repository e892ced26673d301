// tests/cli.rs

use assert_cmd::prelude::*;
use predicates::prelude::*;

mod common;
use common::repotar_cmd;

#[test]
fn test_help_lists_options() {
    repotar_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--workspace-dir"))
        .stdout(predicate::str::contains("--allowed-host"))
        .stdout(predicate::str::contains("--no-enforce-timeout"));
}

#[test]
fn test_version() {
    repotar_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_invalid_port_is_rejected() {
    repotar_cmd()
        .args(["--port", "not-a-port"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--port"));
}

#[test]
fn test_invalid_size_limit_is_rejected() {
    repotar_cmd()
        .args(["--port", "0", "--max-download-size", "lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lots"));
}

#[test]
fn test_unsupported_provider_scheme_is_rejected() {
    repotar_cmd()
        .args(["--port", "0", "--provider-scheme", "ftp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ftp"));
}

#[test]
fn test_bind_failure_exits_with_error() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    repotar_cmd()
        .args(["--bind", "127.0.0.1", "--port", &port.to_string()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to bind"));
}
