//! Common test utilities and fixtures for the integration tests

// not every helper is used by every test module
#![allow(dead_code)]

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Stored templates of a small dashboard.
///
/// `:filter:` is a map whose selected value references `:host:`, and
/// `:host:` is a tag-value list with a selected value already stored.
pub const DASHBOARD_TEMPLATES: &str = r#"[
  {
    "id": "1",
    "tempVar": ":filter:",
    "type": "map",
    "label": "",
    "values": [
      {"key": "with host", "value": "AND host = :host:", "type": "map", "selected": true, "localSelected": false},
      {"key": "everything", "value": "", "type": "map", "selected": false, "localSelected": false}
    ]
  },
  {
    "id": "2",
    "tempVar": ":host:",
    "type": "tagValues",
    "label": "",
    "query": {"influxql": "SHOW TAG VALUES ON :database: WITH KEY = \"host\"", "db": "telegraf"},
    "values": [
      {"value": "srv-1", "type": "tagValue", "selected": true, "localSelected": false},
      {"value": "srv-2", "type": "tagValue", "selected": false, "localSelected": false}
    ]
  },
  {
    "id": "3",
    "tempVar": ":region:",
    "type": "csv",
    "label": "",
    "values": [
      {"value": "north", "type": "csv", "selected": true, "localSelected": false},
      {"value": "south", "type": "csv", "selected": false, "localSelected": false}
    ]
  }
]"#;

/// Isolated directory for running the `tempvar` binary.
pub struct TestProject {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    project_dir: PathBuf,
    home_dir: PathBuf,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().join("project");
        let home_dir = temp_dir.path().join("home");

        fs::create_dir_all(&project_dir)?;
        fs::create_dir_all(&home_dir)?;

        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
            home_dir,
        })
    }

    pub fn project_path(&self) -> &Path {
        &self.project_dir
    }

    /// Fake home directory, so `~/.tempvar/config.toml` is never the real one
    pub fn home_path(&self) -> &Path {
        &self.home_dir
    }

    /// Write a file relative to the project directory and return its path.
    pub fn write_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.project_dir.join(name);
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write `~/.tempvar/config.toml` in the fake home directory.
    pub fn write_home_config(&self, content: &str) -> Result<PathBuf> {
        let dir = self.home_dir.join(".tempvar");
        fs::create_dir_all(&dir)?;
        let path = dir.join("config.toml");
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Run the `tempvar` binary in the project directory.
    pub fn run_tempvar(&self, args: &[&str]) -> Result<CommandOutput> {
        let binary = env!("CARGO_BIN_EXE_tempvar");
        let output = Command::new(binary)
            .args(args)
            .current_dir(&self.project_dir)
            .env("HOME", &self.home_dir)
            .env("USERPROFILE", &self.home_dir)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("TEMPVAR_CONFIG")
            .env_remove("TEMPVAR_ENDPOINT")
            .output()
            .context("Failed to run tempvar command")?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

/// Command output helper
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success,
            "Command failed with code {:?}\nStderr: {}",
            self.code, self.stderr
        );
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert!(!self.success, "Command unexpectedly succeeded\nStdout: {}", self.stdout);
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Expected stdout to contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Expected stderr to contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
