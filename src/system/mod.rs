/// System module: external command execution and workspace layout

pub mod health;
pub mod paths;

use crate::error::CommandError;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Logging macro for pipeline milestones
#[macro_export]
macro_rules! log_parsed {
    ($($arg:tt)*) => {{
        let msg = format!($($arg)*);
        // Use target="parsed" for high-level events
        log::info!(target: "parsed", "{}", msg);
    }}
}

/// A fully described external command.
///
/// Arguments are always passed as separate argv entries, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Extra environment assignments layered over the inherited environment
    pub env: Vec<(String, String)>,
    /// Echo stdout lines at info level while the command runs
    pub stream: bool,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            stream: false,
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

    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    /// Run under `prefix` (e.g. `sudo`) when one is configured.
    pub fn privileged(self, prefix: Option<&str>) -> Self {
        match prefix {
            Some(p) if !p.is_empty() => {
                let mut args = Vec::with_capacity(self.args.len() + 1);
                args.push(self.program.to_string_lossy().to_string());
                args.extend(self.args);
                Invocation {
                    program: PathBuf::from(p),
                    args,
                    env: self.env,
                    stream: self.stream,
                }
            }
            _ => self,
        }
    }

    /// Human-readable command line for logs and error messages
    pub fn display(&self) -> String {
        let mut line = self.program.to_string_lossy().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Captured output of a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

async fn collect_lines<R: AsyncRead + Unpin>(reader: Option<R>, echo: bool) -> String {
    let mut captured = String::new();
    if let Some(reader) = reader {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if echo {
                log::info!("  {}", line);
            } else {
                log::trace!("  {}", line);
            }
            captured.push_str(&line);
            captured.push('\n');
        }
    }
    captured
}

/// Run a command to completion, capturing stdout and stderr.
///
/// A non-zero exit becomes `CommandError::Exit` carrying the captured stderr
/// (or stdout when stderr is empty, since some tools report errors there).
pub async fn run(invocation: &Invocation) -> Result<CommandOutput, CommandError> {
    let cmd = invocation.display();
    log::debug!("[System] Running: {}", cmd);

    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| CommandError::Spawn {
            cmd: cmd.clone(),
            reason: e.to_string(),
        })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (stdout, stderr, status) = tokio::join!(
        collect_lines(stdout, invocation.stream),
        collect_lines(stderr, false),
        child.wait()
    );

    let status = status.map_err(|e| CommandError::Spawn {
        cmd: cmd.clone(),
        reason: e.to_string(),
    })?;

    if status.success() {
        Ok(CommandOutput { stdout, stderr })
    } else {
        let detail = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        log::debug!("[System] '{}' exited with {:?}: {}", cmd, status.code(), detail);
        Err(CommandError::Exit {
            cmd,
            code: status.code(),
            stderr: detail,
        })
    }
}
