use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test harness for running CLI commands with temporary databases
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
}

impl CliTestHarness {
    /// Create a new test harness with a temporary database
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");

        Self { temp_dir, db_path }
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("tasklane").expect("Failed to find tasklane binary");

        cmd.current_dir(self.temp_dir.path());
        cmd.env("TASKLANE_CONFIG", self.temp_dir.path().join("tasklane.toml"));
        cmd.env("TASKLANE_DATABASE_PATH", &self.db_path);
        cmd.env_remove("TASKLANE_USER");
        cmd.env_remove("TASKLANE_TIMEZONE");
        cmd.env_remove("RUST_LOG");

        cmd
    }

    /// Write a config file that the binary will pick up
    pub fn write_config(&self, contents: &str) {
        std::fs::write(self.temp_dir.path().join("tasklane.toml"), contents)
            .expect("Failed to write config");
    }

    /// Write a file into the harness directory and return its path
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents).expect("Failed to write file");
        path
    }

    /// Whether a file with this name exists in the harness directory
    pub fn has_file(&self, name: &str) -> bool {
        self.temp_dir.path().join(name).exists()
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Adds a task and returns its short ID as printed by `add`
    pub fn add_task(&self, args: &[&str]) -> String {
        let mut full = vec!["add"];
        full.extend_from_slice(args);
        let output = self.run_success(&full).get_output().stdout.clone();
        let stdout = String::from_utf8(output).expect("stdout is not UTF-8");
        stdout
            .lines()
            .find(|line| line.contains("Task ID:"))
            .and_then(|line| line.split_whitespace().last())
            .map(str::to_string)
            .expect("add did not print a task ID")
    }
}

/// Utility functions for test assertions
pub mod assertions {
    use super::*;

    /// Predicate to check if output contains task table headers
    pub fn has_task_table_headers() -> impl Predicate<str> {
        predicate::str::contains("ID")
            .and(predicate::str::contains("Title"))
            .and(predicate::str::contains("Deadline"))
    }

    /// Predicate to check if output indicates successful task creation
    pub fn task_created_successfully() -> impl Predicate<str> {
        predicate::str::contains("✓").and(predicate::str::contains("Created task"))
    }

    /// Predicate to check for empty result set
    pub fn empty_result() -> impl Predicate<str> {
        predicate::str::contains("No tasks found")
    }

    /// Predicate to check for error messages
    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}
