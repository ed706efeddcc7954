//! Runs the `treewatch` binary with timing
//!
//! Commands run with an isolated config directory so a user's own config
//! file never leaks into a test.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

/// CLI command builder
pub struct TwCommand {
    args: Vec<String>,
    config_home: PathBuf,
}

impl TwCommand {
    /// New command whose default config lives under `config_home`
    pub fn new(config_home: impl AsRef<Path>) -> Self {
        Self {
            args: Vec::new(),
            config_home: config_home.as_ref().to_path_buf(),
        }
    }

    /// Add command arguments
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_treewatch"));
        command
            .args(&self.args)
            .env("XDG_CONFIG_HOME", &self.config_home)
            .env_remove("RUST_LOG")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }

    /// Run to completion
    pub fn execute(&self) -> Result<CommandResult> {
        let start = Instant::now();
        let output = self.command().output().context("Failed to execute command")?;
        Ok(CommandResult::new(output, start.elapsed()))
    }

    /// Start in the background; finish with [`CommandResult::wait`]
    pub fn spawn(&self) -> Result<Running> {
        let start = Instant::now();
        let child = self.command().spawn().context("Failed to spawn command")?;
        Ok(Running { child, start })
    }

    /// Execute and assert success
    pub fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute()?;
        if !result.success() {
            anyhow::bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStdout: {}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stdout,
                result.stderr
            );
        }
        Ok(result)
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;
        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }
        Ok(result)
    }
}

/// A command running in the background
pub struct Running {
    child: Child,
    start: Instant,
}

impl Running {
    /// Wait for exit and collect output
    pub fn wait(self) -> Result<CommandResult> {
        let output = self.child.wait_with_output().context("Failed to wait for command")?;
        Ok(CommandResult::new(output, self.start.elapsed()))
    }
}

/// Command execution result with timing
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandResult {
    fn new(output: Output, duration: Duration) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }
}
