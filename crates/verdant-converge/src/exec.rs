//! External command execution
//!
//! Every shelled-out tool goes through the `Runner` trait so the rest of
//! the engine can be exercised in tests without spawning processes.
//!
//! Secrets destined for a tool are injected into that invocation's
//! environment only; the process-global environment is never mutated, so a
//! later namespace's secrets can never leak into an earlier apply call.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;

use crate::error::{ConvergeError, Result};

/// One external command invocation: program, arguments, extra environment,
/// working directory.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    env: IndexMap<String, String>,
    cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
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

    /// Add one environment variable for this invocation only.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Add a whole environment map for this invocation only.
    pub fn envs(mut self, vars: &IndexMap<String, String>) -> Self {
        for (key, value) in vars {
            self.env.insert(key.clone(), value.clone());
        }
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn environment(&self) -> &IndexMap<String, String> {
        &self.env
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Human-readable command line for log output.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Result of a captured invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub status: i32,
    pub stdout: String,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Executes external commands.
///
/// Implementations must be Send + Sync; the engine itself is single-threaded
/// but runners are shared by reference across components.
pub trait Runner: Send + Sync {
    /// Run an invocation with inherited stdio, returning its exit status.
    fn run(&self, invocation: &Invocation) -> Result<i32>;

    /// Run an invocation capturing stdout (probes and status queries).
    fn capture(&self, invocation: &Invocation) -> Result<RunOutput>;

    /// Run an invocation and fail on a non-zero exit status.
    fn run_checked(&self, invocation: &Invocation) -> Result<()> {
        let status = self.run(invocation)?;
        if status != 0 {
            return Err(ConvergeError::CommandFailed {
                program: invocation.program().to_string(),
                status,
            });
        }
        Ok(())
    }
}

/// Real runner spawning blocking subprocesses.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl ShellRunner {
    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(invocation.program());
        cmd.args(invocation.arguments());
        cmd.envs(invocation.environment());
        if let Some(dir) = invocation.working_dir() {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl Runner for ShellRunner {
    fn run(&self, invocation: &Invocation) -> Result<i32> {
        tracing::info!(command = %invocation.command_line(), "running");
        let status = Self::command(invocation).status()?;
        Ok(status.code().unwrap_or(-1))
    }

    fn capture(&self, invocation: &Invocation) -> Result<RunOutput> {
        tracing::debug!(command = %invocation.command_line(), "probing");
        let output = Self::command(invocation)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()?;
        Ok(RunOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Recording runner for tests: logs every invocation and serves scripted
/// statuses and outputs instead of spawning anything.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    invocations: Arc<Mutex<Vec<Invocation>>>,
    statuses: Arc<Mutex<Vec<i32>>>,
    outputs: Arc<Mutex<Vec<RunOutput>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an exit status for the next `run` call (default 0).
    pub fn push_status(&self, status: i32) {
        self.statuses.lock().unwrap().push(status);
    }

    /// Queue stdout for the next `capture` call (default empty, status 0).
    pub fn push_capture(&self, stdout: impl Into<String>) {
        self.outputs.lock().unwrap().push(RunOutput {
            status: 0,
            stdout: stdout.into(),
        });
    }

    /// Every invocation seen so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Command lines of every invocation, for assertions.
    pub fn command_lines(&self) -> Vec<String> {
        self.invocations().iter().map(Invocation::command_line).collect()
    }
}

impl Runner for RecordingRunner {
    fn run(&self, invocation: &Invocation) -> Result<i32> {
        self.invocations.lock().unwrap().push(invocation.clone());
        let mut statuses = self.statuses.lock().unwrap();
        Ok(if statuses.is_empty() { 0 } else { statuses.remove(0) })
    }

    fn capture(&self, invocation: &Invocation) -> Result<RunOutput> {
        self.invocations.lock().unwrap().push(invocation.clone());
        let mut outputs = self.outputs.lock().unwrap();
        Ok(if outputs.is_empty() {
            RunOutput::default()
        } else {
            outputs.remove(0)
        })
    }
}
