//! Process-execution abstraction for external tools.
//!
//! Every external invocation goes through [`CommandInvoker`], so the
//! orchestration layer can be exercised in tests with a scripted invoker
//! instead of real ogr2ogr/tippecanoe binaries.

use crate::{Error, Result};
use std::fmt;
use std::path::Path;
use std::process::Command;

/// A fully resolved command line, ready to be spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    /// Start building a command for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a path argument.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The program to spawn.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The argument list.
    pub fn arg_list(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of one external invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Exit code, if the process exited normally.
    pub status: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl Invocation {
    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// A short diagnostic string for failure reporting.
    ///
    /// Prefers stderr, falls back to stdout, then to the bare exit code.
    pub fn failure_detail(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        format!("exit code {:?}", self.status)
    }
}

/// Abstraction over spawning external processes.
pub trait CommandInvoker {
    /// Run the command to completion, capturing output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process could not be spawned at all; a
    /// non-zero exit is reported through [`Invocation::status`], not as
    /// an `Err`.
    fn invoke(&self, spec: &CommandSpec) -> Result<Invocation>;
}

/// Invoker that spawns real processes, blocking until they exit.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInvoker;

impl CommandInvoker for SystemInvoker {
    fn invoke(&self, spec: &CommandSpec) -> Result<Invocation> {
        tracing::debug!("Executing: {}", spec);

        let output = Command::new(spec.program())
            .args(spec.arg_list())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::tool_not_found(spec.program())
                } else {
                    Error::Io(e)
                }
            })?;

        Ok(Invocation {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run a command and fail if it exits non-zero.
pub(crate) fn invoke_checked(
    invoker: &dyn CommandInvoker,
    tool: &str,
    spec: &CommandSpec,
) -> Result<Invocation> {
    let run = invoker.invoke(spec)?;
    if !run.success() {
        return Err(Error::tool_failed(tool, run.failure_detail()));
    }
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_display_quotes_spaces() {
        let spec = CommandSpec::new("ogr2ogr")
            .args(["-f", "GeoJSON"])
            .arg("out with space.geojson");
        assert_eq!(
            spec.to_string(),
            "ogr2ogr -f GeoJSON \"out with space.geojson\""
        );
    }

    #[test]
    fn test_invocation_failure_detail_prefers_stderr() {
        let run = Invocation {
            status: Some(1),
            stdout: "progress".to_string(),
            stderr: "boom".to_string(),
        };
        assert_eq!(run.failure_detail(), "boom");

        let quiet = Invocation {
            status: Some(2),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(quiet.failure_detail(), "exit code Some(2)");
    }

    #[test]
    fn test_system_invoker_missing_program() {
        let spec = CommandSpec::new("definitely_not_a_real_tool_12345");
        let err = SystemInvoker.invoke(&spec).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }
}
