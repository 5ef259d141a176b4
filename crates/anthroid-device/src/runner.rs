//! Command execution with timeouts.
//!
//! A non-zero exit status is not an error here: the combined output is handed
//! back to the agent as-is. Only failing to start the program, or running past
//! the timeout, produces an [`AnthroidError`].

use anthroid_config::CommandsConfig;
use anthroid_core::{AnthroidError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tracing::debug;

/// One program invocation: argv plus a timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl Invocation {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
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

    /// Human-readable form for logs.
    pub fn display(&self) -> String {
        let mut s = self.program.clone();
        for a in &self.args {
            s.push(' ');
            s.push_str(a);
        }
        s
    }
}

/// Captured output of a finished program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// None when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stdout: text.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Anything that can run programs on (or against) the device.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Shell used by [`CommandRunner::run_shell`].
    fn shell(&self) -> &str;

    /// Timeout applied to shell commands.
    fn default_timeout(&self) -> Duration;

    /// Run a program and capture its output.
    async fn exec(&self, invocation: &Invocation) -> Result<CommandOutput>;

    /// Run a command string through the shell and return stdout + stderr.
    async fn run_shell(&self, command: &str) -> Result<String> {
        let invocation = Invocation::new(self.shell(), self.default_timeout())
            .arg("-c")
            .arg(command);
        Ok(self.exec(&invocation).await?.combined())
    }
}

/// Runs programs on the local machine with `tokio::process`.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    shell: String,
    timeout: Duration,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(&CommandsConfig::default())
    }
}

impl SystemRunner {
    pub fn new(config: &CommandsConfig) -> Self {
        Self {
            shell: config.shell.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    fn shell(&self) -> &str {
        &self.shell
    }

    fn default_timeout(&self) -> Duration {
        self.timeout
    }

    async fn exec(&self, invocation: &Invocation) -> Result<CommandOutput> {
        debug!(command = %invocation.display(), timeout = ?invocation.timeout, "running command");

        let mut cmd = tokio::process::Command::new(&invocation.program);
        cmd.args(&invocation.args)
            // stdin carries the JSON-RPC stream; children must not read from it
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(invocation.timeout, cmd.output())
            .await
            .map_err(|_| AnthroidError::CommandTimeout {
                program: invocation.program.clone(),
                timeout: invocation.timeout,
            })?
            .map_err(|e| AnthroidError::CommandLaunch {
                program: invocation.program.clone(),
                reason: e.to_string(),
            })?;

        let output = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        };
        debug!(
            program = %invocation.program,
            exit_code = ?output.exit_code,
            bytes = output.stdout.len() + output.stderr.len(),
            "command finished"
        );
        Ok(output)
    }
}

/// Escape a value for embedding inside a double-quoted shell word.
pub fn escape_double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
