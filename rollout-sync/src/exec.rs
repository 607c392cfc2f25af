//! Process execution seam.
//!
//! Every external call goes through [`CommandRunner`] so the command sequences
//! can be exercised without a cluster. Programs are spawned directly with an
//! argument vector; no shell is involved.

use std::process::Command;

use thiserror::Error;

/// Failure of a single external command.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Non-zero exit. `stderr` is empty for streamed commands.
    #[error("command failed ({status}): {command}{}", stderr_suffix(.stderr))]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\nError: {stderr}")
    }
}

pub trait CommandRunner {
    /// Run to completion and return trimmed stdout.
    fn capture(&self, program: &str, args: &[String]) -> Result<String, ExecError>;

    /// Run with inherited stdio so output goes straight to the terminal.
    fn stream(&self, program: &str, args: &[String]) -> Result<(), ExecError>;
}

/// Runs real processes via `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn capture(&self, program: &str, args: &[String]) -> Result<String, ExecError> {
        let command = render_command(program, args);
        tracing::debug!("running: {command}");

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!("command failed ({}): {command}: {stderr}", output.status);
            return Err(ExecError::Failed {
                command,
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn stream(&self, program: &str, args: &[String]) -> Result<(), ExecError> {
        let command = render_command(program, args);
        tracing::debug!("running (streamed): {command}");

        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|source| ExecError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !status.success() {
            tracing::warn!("command failed ({status}): {command}");
            return Err(ExecError::Failed {
                command,
                status: status.to_string(),
                stderr: String::new(),
            });
        }
        Ok(())
    }
}

/// Human-readable command line for logs and error messages.
pub fn render_command(program: &str, args: &[String]) -> String {
    let mut rendered = program.to_string();
    for arg in args {
        rendered.push(' ');
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            rendered.push('\'');
            rendered.push_str(arg);
            rendered.push('\'');
        } else {
            rendered.push_str(arg);
        }
    }
    rendered
}
