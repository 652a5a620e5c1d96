use crate::error::{HarnessError, Result};
use crate::payload::{Payload, DEFAULT_CWD};
use crate::result::{format_duration, HookResult};
use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Environment variable naming the project root for the hook
pub const PROJECT_DIR_ENV: &str = "CLAUDE_PROJECT_DIR";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How to invoke a hook
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub timeout: Duration,
    /// Extra environment for the hook, applied after `CLAUDE_PROJECT_DIR`
    pub env: BTreeMap<String, String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            env: BTreeMap::new(),
        }
    }
}

impl RunOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

/// Run `hook` with `payload` on stdin and capture what it does.
///
/// `options.timeout` bounds both the hook's exit and the closing of its output
/// pipes, so a background child still holding stdout counts as running. On
/// timeout the hook's process group is killed and the result has `timed_out`
/// set. Errors are reserved for the harness failing to run the hook at all.
pub fn run_hook(hook: &Path, payload: &Payload, options: &RunOptions) -> Result<HookResult> {
    let input = payload.to_json()?;

    let mut command = Command::new(hook);
    command
        .env(PROJECT_DIR_ENV, payload.cwd().unwrap_or(DEFAULT_CWD))
        .envs(&options.env)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // Own process group so the hook's children can be killed with it
        command.process_group(0);
    }

    let deadline = Instant::now() + options.timeout;
    let mut child = command.spawn().map_err(|source| HarnessError::Spawn {
        path: hook.to_path_buf(),
        source,
    })?;
    tracing::debug!(hook = %hook.display(), pid = child.id(), "spawned hook");

    let writer = child.stdin.take().map(|stdin| feed_stdin(stdin, input));
    let (tx, rx) = mpsc::channel();
    let mut pending = 0;
    if let Some(stdout) = child.stdout.take() {
        drain(Stream::Stdout, stdout, tx.clone());
        pending += 1;
    }
    if let Some(stderr) = child.stderr.take() {
        drain(Stream::Stderr, stderr, tx.clone());
        pending += 1;
    }
    drop(tx);

    let Some(status) = wait_until(&mut child, deadline)? else {
        return Ok(timed_out(hook, &mut child, options.timeout));
    };

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    while pending > 0 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((Stream::Stdout, bytes)) => stdout = bytes?,
            Ok((Stream::Stderr, bytes)) => stderr = bytes?,
            Err(RecvTimeoutError::Timeout) => {
                return Ok(timed_out(hook, &mut child, options.timeout));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(io::Error::other("output reader thread exited early").into());
            }
        }
        pending -= 1;
    }

    // Descendants that let go of the pipes may still be running
    kill_group(&child);

    if let Some(writer) = writer {
        match writer.join() {
            Ok(result) => result?,
            Err(_) => return Err(io::Error::other("stdin writer thread panicked").into()),
        }
    }

    let exit_code = exit_code(status);
    tracing::debug!(hook = %hook.display(), exit_code, "hook finished");

    Ok(HookResult::new(
        exit_code,
        String::from_utf8_lossy(&stdout).into_owned(),
        String::from_utf8_lossy(&stderr).into_owned(),
    ))
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

type Chunk = (Stream, io::Result<Vec<u8>>);

fn feed_stdin(mut stdin: ChildStdin, input: String) -> JoinHandle<io::Result<()>> {
    thread::spawn(move || match stdin.write_all(input.as_bytes()) {
        // Hooks are free to ignore their input and exit early
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    })
}

/// Read `reader` to EOF on its own thread and send the bytes to `tx`.
fn drain<R: Read + Send + 'static>(stream: Stream, mut reader: R, tx: Sender<Chunk>) {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let read = reader.read_to_end(&mut buffer).map(|_| buffer);
        // The receiver is gone once the run has timed out
        let _ = tx.send((stream, read));
    });
}

/// Poll the child until it exits or `deadline` passes (`None`).
fn wait_until(child: &mut Child, deadline: Instant) -> Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

fn timed_out(hook: &Path, child: &mut Child, timeout: Duration) -> HookResult {
    tracing::warn!(
        hook = %hook.display(),
        timeout = %format_duration(timeout),
        "hook timed out, killing process group"
    );
    kill_group(child);
    if let Err(e) = child.kill() {
        tracing::debug!(error = %e, "kill after timeout");
    }
    if let Err(e) = child.wait() {
        tracing::warn!(error = %e, "failed to reap timed out hook");
    }
    HookResult::timeout(timeout)
}

/// SIGKILL everything left in the hook's process group.
fn kill_group(child: &Child) {
    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let pgid = Pid::from_raw(child.id() as i32);
        match killpg(pgid, Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => tracing::warn!(pgid = %pgid, error = %e, "failed to kill hook process group"),
        }
    }
    #[cfg(not(unix))]
    let _ = child;
}

/// Exit code of a finished hook; death by signal N reads as `-N`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}
