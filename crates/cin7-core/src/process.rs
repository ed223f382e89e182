//! Invocation of the external tools the CLI drives: package managers, `npx`
//! and `git`.
//!
//! Programs are resolved with `which` before spawning so a missing tool is
//! reported as `ToolNotFound` rather than a bare spawn error, and so Windows
//! `.cmd` shims (`npm.cmd`, `npx.cmd`) are found.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Cin7Error, Result};

/// A fully described child process, ready to run in several ways.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Build a `std::process::Command` with the program resolved on `PATH`.
    pub fn to_command(&self) -> Result<Command> {
        let program = resolve_program(&self.program)?;
        let mut cmd = Command::new(program);
        cmd.args(&self.args).current_dir(&self.cwd);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        Ok(cmd)
    }

    /// Run with the terminal attached. A non-zero exit is an error.
    pub fn run_inherit(&self) -> Result<()> {
        tracing::debug!(command = %self, cwd = %self.cwd.display(), "running");
        let status = self
            .to_command()?
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| self.failed(e.to_string()))?;
        if !status.success() {
            return Err(self.failed(exit_description(status.code())));
        }
        Ok(())
    }

    /// Run with output captured and return stdout. On failure the error
    /// carries the head of stderr.
    pub fn run_quiet(&self) -> Result<String> {
        tracing::debug!(command = %self, cwd = %self.cwd.display(), "running quietly");
        let output = self
            .to_command()?
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.failed(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let head: String = stderr.trim().chars().take(500).collect();
            let message = if head.is_empty() {
                exit_description(output.status.code())
            } else {
                head
            };
            return Err(self.failed(message));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn failed(&self, message: String) -> Cin7Error {
        Cin7Error::CommandFailed {
            command: self.to_string(),
            message,
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Locate `name` on `PATH`.
pub fn resolve_program(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Cin7Error::ToolNotFound(name.to_string()))
}

fn exit_description(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_quotes_arguments_with_spaces() {
        let spec = CommandSpec::new("git", Path::new("."))
            .args(["commit", "-m"])
            .arg("Initial commit");
        assert_eq!(spec.to_string(), "git commit -m \"Initial commit\"");
    }

    #[test]
    fn env_is_recorded_in_order() {
        let spec = CommandSpec::new("npx", Path::new("."))
            .env("NODE_ENV", "production")
            .env("VITE_BUILD_TARGET", "es2020");
        assert_eq!(spec.env[0], ("NODE_ENV".into(), "production".into()));
        assert_eq!(spec.env[1].0, "VITE_BUILD_TARGET");
    }

    #[test]
    fn missing_program_is_tool_not_found() {
        let err = CommandSpec::new("cin7-definitely-not-installed", Path::new("."))
            .run_quiet()
            .unwrap_err();
        assert!(matches!(err, Cin7Error::ToolNotFound(_)));
    }
}
