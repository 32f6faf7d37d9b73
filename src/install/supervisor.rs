use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsFd, AsRawFd};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use nix::errno::Errno;
use nix::fcntl::{FcntlArg, OFlag, fcntl};
use nix::poll::{PollFd, PollFlags, PollTimeout, poll};
use nix::sys::signal::{Signal, killpg};
use nix::sys::wait::{Id, WaitPidFlag, WaitStatus, waitid};
use nix::unistd::{Pid, pipe2};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::classifier::classify;
use super::model::{DEFAULT_SWAP_GB, InstallConfig};

pub const SUCCESS_MESSAGE: &str = "Installation successful!";

/// How often the exit status is checked while output is quiet
const POLL_INTERVAL_MS: u16 = 100;

/// Events produced by one installation run, in the order they happened.
///
/// `Finished` is always the last event on the channel and is sent exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// A line of merged installer output
    Log(String),
    /// A line that carried a phase marker
    Progress { percent: u8, message: String },
    Finished(ProcessOutcome),
}

/// Terminal result of an installation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Succeeded,
    Failed(InstallFailure),
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        matches!(self, ProcessOutcome::Succeeded)
    }

    pub fn message(&self) -> String {
        match self {
            ProcessOutcome::Succeeded => SUCCESS_MESSAGE.to_string(),
            ProcessOutcome::Failed(failure) => failure.to_string(),
        }
    }

    pub fn failure(&self) -> Option<&InstallFailure> {
        match self {
            ProcessOutcome::Succeeded => None,
            ProcessOutcome::Failed(failure) => Some(failure),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstallFailure {
    #[error("Could not launch installer '{program}': {reason}")]
    Spawn { program: String, reason: String },

    #[error("{}", exit_message(.code, .context))]
    Exit {
        code: Option<i32>,
        /// Most recent non-empty line of installer output
        context: Option<String>,
    },

    #[error("Installation cancelled. Changes already written to disk were not rolled back")]
    Cancelled,

    #[error("Lost installer output: {0}")]
    Stream(String),

    #[error("Installer supervisor failed: {0}")]
    Worker(String),
}

fn exit_message(code: &Option<i32>, context: &Option<String>) -> String {
    let status = match code {
        Some(code) => format!("Installation failed (exit code {code})"),
        None => "Installation failed (installer terminated by signal)".to_string(),
    };
    match context {
        Some(line) => format!("{status}: {line}"),
        None => status,
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorError {
    #[error("An installation is already running")]
    AlreadyRunning,
}

/// Build the installer argument vector for a frozen configuration
pub fn installer_args(config: &InstallConfig) -> Vec<String> {
    let mut args = vec![
        "--auto".to_string(),
        "--disk".to_string(),
        config.device.clone(),
        "--username".to_string(),
        config.username.clone(),
        "--hostname".to_string(),
        config.hostname.clone(),
        "--timezone".to_string(),
        config.timezone.clone(),
    ];

    if config.encrypt {
        args.push("--encrypt".to_string());
    }

    if config.swap_gb != DEFAULT_SWAP_GB {
        args.push("--swap-size".to_string());
        args.push(config.swap_size());
    }

    args
}

/// Shared between the supervisor handle and its worker
#[derive(Debug, Default)]
struct RunState {
    running: AtomicBool,
    cancel_requested: AtomicBool,
    /// Installer pid, doubling as its process group id. 0 when no unreaped
    /// child exists; cleared under the lock before the child is reaped.
    pid: Mutex<i32>,
}

impl RunState {
    fn set_pid(&self, pid: i32) {
        *self.pid.lock().unwrap_or_else(PoisonError::into_inner) = pid;
    }

    /// SIGTERM the installer's process group, if the leader is not reaped yet
    fn terminate(&self) {
        let pid = self.pid.lock().unwrap_or_else(PoisonError::into_inner);
        if *pid > 0 {
            if let Err(e) = killpg(Pid::from_raw(*pid), Signal::SIGTERM) {
                warn!("Failed to signal installer process group {}: {e}", *pid);
            }
        }
    }
}

/// Owns the lifecycle of the external installer process
pub struct Supervisor {
    /// Program and leading arguments, including any privilege wrapper
    command: Vec<String>,
    state: Arc<RunState>,
}

impl Supervisor {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            state: Arc::new(RunState::default()),
        }
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    /// Launch the installer for `config` and return the event stream.
    ///
    /// Must be called from within a tokio runtime. Spawn failures are not
    /// returned here; they arrive as a failed [`SupervisorEvent::Finished`].
    pub fn start(
        &self,
        config: InstallConfig,
    ) -> Result<mpsc::UnboundedReceiver<SupervisorEvent>, SupervisorError> {
        if self
            .state
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SupervisorError::AlreadyRunning);
        }
        self.state.cancel_requested.store(false, Ordering::SeqCst);
        self.state.set_pid(0);

        let args = installer_args(&config);
        info!("Starting installation on {}", config.device_path());
        debug!("Installer command: {:?} {:?}", self.command, args);

        let command = self.command.clone();
        let state = Arc::clone(&self.state);
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let worker_tx = tx.clone();
            let worker_state = Arc::clone(&state);
            let result = tokio::task::spawn_blocking(move || {
                run_installer(&command, &args, &worker_state, &worker_tx)
            })
            .await;

            let outcome = match result {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Installer worker failed: {e}");
                    ProcessOutcome::Failed(InstallFailure::Worker(e.to_string()))
                }
            };

            state.set_pid(0);
            state.running.store(false, Ordering::SeqCst);

            info!("Installation finished: {}", outcome.message());
            let _ = tx.send(SupervisorEvent::Finished(outcome));
        });

        Ok(rx)
    }

    /// Ask the running installer to terminate.
    ///
    /// Sends SIGTERM to the installer's process group. Nothing is rolled
    /// back; output already in the pipe is still delivered before the
    /// outcome. Returns false when no installation is running.
    pub fn cancel(&self) -> bool {
        if !self.is_running() {
            return false;
        }

        self.state.cancel_requested.store(true, Ordering::SeqCst);
        info!("Cancellation requested");
        self.state.terminate();
        true
    }
}

/// Runs on a blocking thread for the whole life of the installer
fn run_installer(
    command: &[String],
    args: &[String],
    state: &RunState,
    tx: &mpsc::UnboundedSender<SupervisorEvent>,
) -> ProcessOutcome {
    let Some((program, leading)) = command.split_first() else {
        return ProcessOutcome::Failed(InstallFailure::Spawn {
            program: String::new(),
            reason: "installer command is empty".to_string(),
        });
    };

    let (mut child, output) = match spawn_merged(program, leading, args) {
        Ok(spawned) => spawned,
        Err(e) => {
            warn!("Failed to launch {program}: {e}");
            return ProcessOutcome::Failed(InstallFailure::Spawn {
                program: program.clone(),
                reason: e.to_string(),
            });
        }
    };

    let pid = child.id() as i32;
    state.set_pid(pid);
    if state.cancel_requested.load(Ordering::SeqCst) {
        state.terminate();
    }
    info!("Installer running with pid {pid}");

    let mut lines = OutputLines::default();
    let watched = watch_until_exit(pid, &output, &mut lines, tx);

    // The installer has exited but is not reaped yet
    let cancelled = state.cancel_requested.load(Ordering::SeqCst);
    let drained = watched.and_then(|()| drain_ready(&output, &mut lines, tx));
    lines.finish(tx);

    state.set_pid(0);
    let status = child.wait();

    if let Err(e) = drained {
        return ProcessOutcome::Failed(InstallFailure::Stream(e.to_string()));
    }

    match status {
        Ok(status) => resolve_exit(status, cancelled, lines.last_line),
        Err(e) => ProcessOutcome::Failed(InstallFailure::Stream(format!(
            "waiting for installer: {e}"
        ))),
    }
}

/// Spawn with stdout and stderr sharing one pipe so their lines stay in order
fn spawn_merged(program: &str, leading: &[String], args: &[String]) -> io::Result<(Child, File)> {
    let (reader, writer) = pipe2(OFlag::O_CLOEXEC)?;
    let stderr_writer = writer.try_clone()?;

    // The Command (and with it the parent's copies of the write end) is
    // dropped at the end of this statement.
    let child = Command::new(program)
        .args(leading)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(writer))
        .stderr(Stdio::from(stderr_writer))
        .process_group(0)
        .spawn()?;

    Ok((child, File::from(reader)))
}

/// Forward output until the installer exits.
///
/// The exit is observed with `WNOWAIT`, so the child stays unreaped and its
/// pid cannot be reused while the caller finishes up. Descendants that keep
/// the pipe open do not hold up the result.
fn watch_until_exit(
    pid: i32,
    output: &File,
    lines: &mut OutputLines,
    tx: &mpsc::UnboundedSender<SupervisorEvent>,
) -> io::Result<()> {
    let mut reader = output;
    let mut buf = [0u8; 4096];
    let mut open = true;

    loop {
        if open {
            let mut fds = [PollFd::new(output.as_fd(), PollFlags::POLLIN)];
            let ready = match poll(&mut fds, PollTimeout::from(POLL_INTERVAL_MS)) {
                Ok(n) => n > 0,
                Err(Errno::EINTR) => false,
                Err(e) => return Err(e.into()),
            };
            if ready {
                match reader.read(&mut buf) {
                    Ok(0) => open = false,
                    Ok(n) => lines.feed(&buf[..n], tx),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => return Err(e),
                }
            }
        }

        // Once the pipe is closed, just block until the installer exits
        let mut flags = WaitPidFlag::WEXITED | WaitPidFlag::WNOWAIT;
        if open {
            flags |= WaitPidFlag::WNOHANG;
        }
        match waitid(Id::Pid(Pid::from_raw(pid)), flags) {
            Ok(WaitStatus::StillAlive) | Err(Errno::EINTR) => continue,
            Ok(_) => return Ok(()),
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read whatever is already buffered in the pipe without waiting for writers
fn drain_ready(
    output: &File,
    lines: &mut OutputLines,
    tx: &mpsc::UnboundedSender<SupervisorEvent>,
) -> io::Result<()> {
    fcntl(output.as_raw_fd(), FcntlArg::F_SETFL(OFlag::O_NONBLOCK))?;

    let mut reader = output;
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => lines.feed(&buf[..n], tx),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

/// Splits raw output into lines, classifying as it goes
#[derive(Default)]
struct OutputLines {
    pending: Vec<u8>,
    /// Most recent non-empty line
    last_line: Option<String>,
}

impl OutputLines {
    fn feed(&mut self, bytes: &[u8], tx: &mpsc::UnboundedSender<SupervisorEvent>) {
        self.pending.extend_from_slice(bytes);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            self.emit(&raw[..pos], tx);
        }
    }

    /// Flush a trailing line that had no newline
    fn finish(&mut self, tx: &mpsc::UnboundedSender<SupervisorEvent>) {
        if !self.pending.is_empty() {
            let raw = std::mem::take(&mut self.pending);
            self.emit(&raw, tx);
        }
    }

    fn emit(&mut self, raw: &[u8], tx: &mpsc::UnboundedSender<SupervisorEvent>) {
        let line = String::from_utf8_lossy(raw).trim().to_string();
        debug!(target: "installer", "{line}");

        let percent = classify(&line);
        if !line.is_empty() {
            self.last_line = Some(line.clone());
        }

        // Receiver gone means nobody is watching; keep draining the pipe anyway.
        let _ = tx.send(SupervisorEvent::Log(line.clone()));
        if let Some(percent) = percent {
            let _ = tx.send(SupervisorEvent::Progress {
                percent,
                message: line,
            });
        }
    }
}

fn resolve_exit(status: ExitStatus, cancelled: bool, context: Option<String>) -> ProcessOutcome {
    if status.success() {
        ProcessOutcome::Succeeded
    } else if cancelled {
        ProcessOutcome::Failed(InstallFailure::Cancelled)
    } else {
        ProcessOutcome::Failed(InstallFailure::Exit {
            code: status.code(),
            context,
        })
    }
}
