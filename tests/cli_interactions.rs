//! CLI options interaction tests
//!
//! These tests run the binary without touching the network: every target is
//! a literal address excluded by the address filter, so no socket is opened
//! and no name server is asked.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "MULTIPING_TARGETS",
    "MULTIPING_WARNING_MS",
    "MULTIPING_CRITICAL_MS",
    "MULTIPING_TIMEOUT_MS",
    "MULTIPING_DEADLINE_MS",
    "MULTIPING_RESOLVE_TIMEOUT_MS",
    "MULTIPING_ATTEMPTS",
    "MULTIPING_ADDRESS_FAMILY",
    "MULTIPING_SOCKET",
    "MULTIPING_DNS_SERVERS",
    "MULTIPING_ENABLE_COLOR",
];

/// Command running in an empty directory with a clean environment
fn create_test_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("multiping").unwrap();
    cmd.current_dir(dir.path()).env("NO_COLOR", "1");
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_help_exits_zero() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--help")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Usage: multiping"))
        .stdout(predicate::str::contains("--first-success"))
        .stdout(predicate::str::contains("--dns-server"));
}

#[test]
fn test_version_exits_zero() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("-V")
        .assert()
        .code(0)
        .stdout(predicate::str::contains(format!("multiping {}", env!("CARGO_PKG_VERSION"))));

    create_test_cmd(&dir)
        .arg("--version")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("built"));
}

#[test]
fn test_conflicting_family_flags() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["-4", "-6", "192.0.2.1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_unknown_option_is_unknown_status() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--bogus", "192.0.2.1"])
        .assert()
        .code(3);

    create_test_cmd(&dir)
        .args(["--socket", "tcp", "192.0.2.1"])
        .assert()
        .code(3);

    create_test_cmd(&dir)
        .args(["-t", "0", "192.0.2.1"])
        .assert()
        .code(3);
}

#[test]
fn test_missing_targets() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .assert()
        .code(3)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("multiping: [VALIDATION]"))
        .stderr(predicate::str::contains("At least one target is required"));
}

#[test]
fn test_inverted_thresholds() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["-w", "600", "-c", "500", "192.0.2.1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("cannot exceed critical threshold"));
}

#[test]
fn test_probe_timeout_beyond_deadline() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["-t", "2000", "-d", "1000", "192.0.2.1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("cannot exceed the deadline"));
}

#[test]
fn test_invalid_dns_server() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--dns-server", "dns.example", "192.0.2.1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid DNS server IP address"));
}

#[test]
fn test_no_targets_found() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["-6", "192.0.2.1"])
        .assert()
        .code(3)
        .stdout("multiping: UNKNOWN - no targets found\nwarning: 192.0.2.1: no IPv6 address found\n");
}

#[test]
fn test_every_target_reported() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["-4", "2001:db8::1", "2001:db8::2"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("warning: 2001:db8::1: no IPv4 address found"))
        .stdout(predicate::str::contains("warning: 2001:db8::2: no IPv4 address found"));
}

#[test]
fn test_json_output() {
    let dir = TempDir::new().unwrap();
    let output = create_test_cmd(&dir)
        .args(["--format", "json", "-4", "2001:db8::1"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["status"], "UNKNOWN");
    assert_eq!(value["best"], serde_json::Value::Null);
    assert_eq!(value["warnings"][0]["target"], "2001:db8::1");
    assert_eq!(value["thresholds"]["warning"], 0.05);
}

#[test]
fn test_verbose_table_on_stderr() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--verbose", "-6", "192.0.2.1"])
        .assert()
        .code(3)
        .stdout(predicate::str::starts_with("multiping: UNKNOWN"))
        .stderr(predicate::str::contains("No addresses were probed"))
        .stderr(predicate::str::contains("Status: UNKNOWN"));
}

#[test]
fn test_env_example() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .arg("--env-example")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("# MULTIPING_TARGETS="))
        .stdout(predicate::str::contains("# MULTIPING_DEADLINE_MS="));
}

#[test]
fn test_env_file_in_working_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".env"),
        "MULTIPING_TARGETS=2001:db8::1\nMULTIPING_ADDRESS_FAMILY=ipv4\n",
    )
    .unwrap();

    create_test_cmd(&dir)
        .assert()
        .code(3)
        .stdout(predicate::str::contains("warning: 2001:db8::1: no IPv4 address found"));
}

#[test]
fn test_cli_overrides_environment() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .env("MULTIPING_TARGETS", "192.0.2.1")
        .env("MULTIPING_ADDRESS_FAMILY", "ipv4")
        .args(["-6", "192.0.2.2"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("warning: 192.0.2.2: no IPv6 address found"))
        .stdout(predicate::str::contains("192.0.2.1").not());
}

#[test]
fn test_invalid_environment_value() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .env("MULTIPING_ATTEMPTS", "many")
        .arg("192.0.2.1")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("MULTIPING_ATTEMPTS"));
}

#[test]
fn test_informational_advisories_need_verbose() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .args(["--socket", "raw", "-6", "192.0.2.1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("CAP_NET_RAW").not());

    create_test_cmd(&dir)
        .args(["--verbose", "--socket", "raw", "-6", "192.0.2.1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Raw ICMP sockets need root or CAP_NET_RAW"));
}

#[test]
fn test_out_of_range_environment_value() {
    let dir = TempDir::new().unwrap();
    create_test_cmd(&dir)
        .env("MULTIPING_DEADLINE_MS", "0")
        .arg("192.0.2.1")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid MULTIPING_DEADLINE_MS value '0'"));
}
