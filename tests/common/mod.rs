#![allow(dead_code)]

use assert_cmd::cargo_bin;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// `shipment` command pointed at `key_dir`.
pub fn shipment(key_dir: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin!("shipment"));
    cmd.env_remove("SHIPMENT_URL")
        .env_remove("RUST_LOG")
        .arg("--key-dir")
        .arg(key_dir);
    cmd
}

pub fn shipment_tp() -> Command {
    let mut cmd = Command::new(cargo_bin!("shipment-tp"));
    cmd.env_remove("RUST_LOG");
    cmd
}

pub fn keygen(key_dir: &Path, place: &str) {
    let output = shipment(key_dir)
        .args(["keygen", place])
        .output()
        .expect("Failed to execute keygen");
    assert!(output.status.success(), "keygen {place} failed: {output:?}");
}

/// Runs a write command with `--output` and returns the batch file path.
pub fn write_batch(key_dir: &Path, name: &str, args: &[&str]) -> PathBuf {
    let path = key_dir.join(format!("{name}.batch"));
    let output = shipment(key_dir)
        .args(args)
        .arg("--output")
        .arg(&path)
        .output()
        .expect("Failed to execute shipment");
    assert!(output.status.success(), "{args:?} failed: {output:?}");
    path
}

pub fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

pub fn read_key(key_dir: &Path, file: &str) -> String {
    std::fs::read_to_string(key_dir.join(file))
        .unwrap()
        .trim()
        .to_string()
}
