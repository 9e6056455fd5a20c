//! Subprocess execution against a toolkit handle
//!
//! Every call runs `<java> -jar <archive> <command> <args...>`, each token a
//! separate process argument. The child's stdout and stderr are drained by
//! two reader threads into one buffer so the combined output is available
//! for diagnostics when the call fails.

use crate::cancel::CancelToken;
use crate::error::{Error, Result};
use crate::toolkit::ToolkitHandle;
use std::ffi::{OsStr, OsString};
use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Fixed argument telling the interpreter to run an archive
const RUN_ARCHIVE_FLAG: &str = "-jar";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

type SharedOutput = Arc<Mutex<Vec<u8>>>;

impl ToolkitHandle {
    /// Run toolkit subcommand `command` with `args`.
    ///
    /// Blocks until the child exits or `cancel` fires. Side effects live in
    /// whatever files the subcommand was pointed at.
    ///
    /// # Errors
    /// - [`Error::Argument`] if `args` is empty; no process is spawned
    /// - [`Error::Cancelled`] if `cancel` fires first; the child is killed
    /// - [`Error::Execution`] on spawn failure or unsuccessful exit, with
    ///   the child's combined output attached
    pub fn execute<I, S>(&self, cancel: &CancelToken, command: &str, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
        if args.is_empty() {
            return Err(Error::argument(command, "no arguments"));
        }
        let cancel = self.effective_token(cancel);
        cancel.check()?;

        let mut process = Command::new(self.interpreter());
        process
            .arg(RUN_ARCHIVE_FLAG)
            .arg(self.archive_path())
            .arg(command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        log::debug!("🔧 {:?}", process);

        let mut child = process.spawn().map_err(|source| Error::Execution {
            command: command.to_string(),
            source,
            output: String::new(),
        })?;

        let output: SharedOutput = Arc::new(Mutex::new(Vec::new()));
        let pumps = spawn_output_pumps(&mut child, &output);

        let status = match wait_or_cancel(&mut child, &cancel) {
            Ok(Some(status)) => status,
            Ok(None) => {
                log::warn!("⏹️  {} cancelled, child killed", command);
                // Pumps are left detached: a lingering grandchild could keep the pipes open
                return Err(Error::Cancelled);
            }
            Err(source) => {
                return Err(Error::Execution {
                    command: command.to_string(),
                    source,
                    output: drain(pumps, &output),
                })
            }
        };

        let output = drain(pumps, &output);
        if status.success() {
            log::debug!("✅ {} finished ({})", command, status);
            Ok(())
        } else {
            log::warn!("❌ {} failed ({})", command, status);
            Err(Error::Execution {
                command: command.to_string(),
                source: io::Error::new(io::ErrorKind::Other, status.to_string()),
                output,
            })
        }
    }
}

/// Poll the child until it exits (`Some`) or `cancel` fires (`None`, child killed and reaped)
fn wait_or_cancel(child: &mut Child, cancel: &CancelToken) -> io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if cancel.is_cancelled() {
            // kill fails only if the child already exited; wait reaps it either way
            let _ = child.kill();
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn spawn_output_pumps(child: &mut Child, output: &SharedOutput) -> Vec<JoinHandle<()>> {
    let mut pumps = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        pumps.push(spawn_pump(stdout, Arc::clone(output)));
    }
    if let Some(stderr) = child.stderr.take() {
        pumps.push(spawn_pump(stderr, Arc::clone(output)));
    }
    pumps
}

fn spawn_pump<R: Read + Send + 'static>(mut reader: R, output: SharedOutput) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut buffer = [0u8; 8192];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => output
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .extend_from_slice(&buffer[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    })
}

/// Wait for the pumps and return everything they captured
fn drain(pumps: Vec<JoinHandle<()>>, output: &SharedOutput) -> String {
    for pump in pumps {
        let _ = pump.join();
    }
    let bytes = output.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    String::from_utf8_lossy(&bytes).into_owned()
}
