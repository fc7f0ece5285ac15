#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{ffi::OsString, process::Stdio, time::Duration};

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncRead, AsyncReadExt, BufReader},
    process::{Child, Command},
    task::JoinHandle,
    time::timeout,
};
use tracing::{debug, warn};

/// Drop guard that terminates a spawned child process if callers forget to
/// await it.
struct ChildDropGuard(Option<Child>);

impl ChildDropGuard {
    /// Wraps the provided child process with the drop guard.
    fn new(child: Child) -> Self {
        Self(Some(child))
    }

    /// Returns a mutable reference to the underlying child process.
    fn child_mut(&mut self) -> Result<&mut Child> {
        self.0
            .as_mut()
            .context("child process already taken from guard")
    }

    /// Prevents the guard from killing the process on drop.
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for ChildDropGuard {
    fn drop(&mut self) {
        if let Some(child) = self.0.as_mut() {
            let _ = child.start_kill();
        }
    }
}

/// Captured result of a bounded subprocess run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    /// Exit code, or `-1` when the process could not be started or was
    /// ended by a signal.
    pub exit_code: i32,
    /// Everything written to stdout, decoded as UTF-8.
    pub stdout:    String,
    /// Everything written to stderr, decoded as UTF-8. Holds the spawn
    /// error when the process could not be started.
    pub stderr:    String,
    /// Whether the deadline passed and the process was terminated.
    pub timed_out: bool,
}

impl RunOutput {
    /// Output for a process that never started.
    fn spawn_failure(err: &anyhow::Error) -> Self {
        Self {
            exit_code: -1,
            stdout:    String::new(),
            stderr:    format!("{err:?}"),
            timed_out: false,
        }
    }
}

/// Drains a pipe on its own task.
fn drain<R>(pipe: R, name: &'static str) -> JoinHandle<Result<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .await
            .with_context(|| format!("failed to read {name}"))?;
        Ok(buf)
    })
}

/// Runs `argv` with an optional wall-clock `deadline`, capturing all output.
///
/// The process inherits this process' environment plus `env`. If the
/// deadline passes the child is killed and `timed_out` is set; output written
/// before that point is still returned. This never fails: a process that
/// cannot be started is reported with exit code `-1` and the reason in
/// `stderr`.
pub async fn run_bounded(
    argv: &[OsString],
    deadline: Option<Duration>,
    env: &[(OsString, OsString)],
) -> RunOutput {
    match run_inner(argv, deadline, env).await {
        Ok(output) => output,
        Err(err) => {
            warn!("could not run {argv:?}: {err:#}");
            RunOutput::spawn_failure(&err)
        }
    }
}

/// Does the work of [`run_bounded`], failing only before the child exists.
async fn run_inner(
    argv: &[OsString],
    deadline: Option<Duration>,
    env: &[(OsString, OsString)],
) -> Result<RunOutput> {
    let (program, args) = argv.split_first().context("empty command line")?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in env {
        cmd.env(key, value);
    }

    let mut guard = ChildDropGuard::new(
        cmd.spawn()
            .with_context(|| format!("failed to spawn process {program:?}"))?,
    );

    let stdout = guard
        .child_mut()?
        .stdout
        .take()
        .context("missing stdout pipe")?;
    let stderr = guard
        .child_mut()?
        .stderr
        .take()
        .context("missing stderr pipe")?;
    let out_task = drain(stdout, "stdout");
    let err_task = drain(stderr, "stderr");

    let child = guard.child_mut()?;
    let (status, timed_out) = match deadline {
        Some(limit) => match timeout(limit, child.wait()).await {
            Ok(status) => (status, false),
            Err(_) => {
                debug!("deadline of {limit:?} passed, killing {program:?}");
                if let Err(e) = child.start_kill() {
                    warn!("failed to kill {program:?}: {e}");
                }
                (child.wait().await, true)
            }
        },
        None => (child.wait().await, false),
    };
    guard.disarm();

    let exit_code = match status {
        Ok(status) => status.code().unwrap_or(-1),
        Err(e) => {
            warn!("failed to wait on {program:?}: {e}");
            -1
        }
    };

    let collect = |joined: std::result::Result<Result<Vec<u8>>, _>| match joined {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        Ok(Err(e)) => {
            warn!("{e:#}");
            String::new()
        }
        Err(e) => {
            warn!("output reader task failed: {e}");
            String::new()
        }
    };
    let stdout = collect(out_task.await);
    let stderr = collect(err_task.await);

    Ok(RunOutput {
        exit_code,
        stdout,
        stderr,
        timed_out,
    })
}
