//! Shared E2E test helpers for `mapkit` binary tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::time::Duration;

/// Default timeout for a script run.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(10);

const MAPKIT_ENV_VARS: &[&str] = &[
    "MAPKIT_READY_TIMEOUT_MS",
    "MAPKIT_CLUSTER_PIXEL_RADIUS",
    "MAPKIT_CLUSTER_MAX_ZOOM",
    "RUST_LOG",
];

/// Build a Command for the `mapkit` binary with a clean environment.
pub fn mapkit_cmd() -> assert_cmd::Command {
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("mapkit");
    cmd.timeout(TIMEOUT_BASIC);
    for var in MAPKIT_ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

/// Joins method calls into a JSON-lines script.
pub fn script(lines: &[serde_json::Value]) -> String {
    lines
        .iter()
        .map(serde_json::Value::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses each stdout line as JSON.
pub fn output_lines(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("stdout line is JSON"))
        .collect()
}
