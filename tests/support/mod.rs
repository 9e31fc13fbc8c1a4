#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub struct TestData {
    dir: TempDir,
}

impl TestData {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.path().join(key)
    }

    pub fn write_entry(&self, key: &str, contents: &str) -> std::io::Result<()> {
        fs::write(self.entry_path(key), contents)
    }

    pub fn read_entry(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.entry_path(key)).ok()
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<()> {
        fs::write(self.dir.path().join("config.toml"), contents)
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = glowtasks_cmd();
        cmd.arg("--data-dir").arg(self.dir.path());
        cmd
    }

    /// Run a command with `--json` and return the parsed envelope.
    pub fn json(&self, args: &[&str]) -> Result<Value, Box<dyn std::error::Error>> {
        let output = self.cmd().arg("--json").args(args).output()?;
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    /// Add a task and return its id.
    pub fn add(&self, args: &[&str]) -> Result<u64, Box<dyn std::error::Error>> {
        let mut full = vec!["add"];
        full.extend_from_slice(args);
        let value = self.json(&full)?;
        value["data"]["id"]
            .as_u64()
            .ok_or_else(|| "missing id in add output".into())
    }
}

pub fn glowtasks_cmd() -> Command {
    let mut cmd = Command::cargo_bin("glowtasks").expect("binary");
    cmd.env_remove("GLOWTASKS_HOME");
    cmd.env_remove("RUST_LOG");
    cmd
}
