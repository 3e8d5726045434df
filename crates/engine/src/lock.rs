// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-process execution lock.
//!
//! An advisory mutex implemented as a lock file containing
//! `{"pid": <int>, "createdAt": <epoch-ms>}`, created with an exclusive
//! create-only write. Presence means held; absence means free. Foreign
//! readers treat any non-conforming content as a stale lock eligible
//! for reclamation, and so does this module.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};

/// Default interval between acquisition attempts while a live holder exists.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors from lock acquisition or release.
///
/// "Already held by a live process" is not an error; it drives the
/// wait/poll path. Anything here is fatal and aborts the run.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("failed to create lock file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read lock file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to remove lock file {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// On-disk lock record. Field names are part of the cross-process
/// contract and stay camelCase.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LockRecord {
    pid: u32,
    created_at: u64,
}

/// Liveness probe for a recorded holder pid. Injectable for tests.
pub trait ProcessProbe: Send + Sync {
    fn is_alive(&self, pid: u32) -> bool;
}

/// Probes via `kill(pid, 0)`. ESRCH means gone; EPERM means alive but
/// owned by another user, which still counts as a live holder.
pub struct SystemProbe;

impl ProcessProbe for SystemProbe {
    fn is_alive(&self, pid: u32) -> bool {
        match nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None) {
            Ok(()) => true,
            Err(nix::errno::Errno::ESRCH) => false,
            Err(_) => true,
        }
    }
}

/// Observer invoked around the wait/poll path.
pub type WaitHook = Arc<dyn Fn() + Send + Sync>;

/// Options for [`acquire`].
#[derive(Clone)]
pub struct LockOptions {
    pub lock_path: PathBuf,
    pub poll_interval: Duration,
    /// Fired once when acquisition first has to wait on a live holder.
    pub on_wait_start: Option<WaitHook>,
    /// Fired when a waited-for acquisition eventually succeeds.
    pub on_wait_end: Option<WaitHook>,
    pub probe: Arc<dyn ProcessProbe>,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self::at(default_lock_path())
    }
}

impl LockOptions {
    pub fn at(lock_path: impl Into<PathBuf>) -> Self {
        Self {
            lock_path: lock_path.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            on_wait_start: None,
            on_wait_end: None,
            probe: Arc::new(SystemProbe),
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn on_wait_start(mut self, hook: WaitHook) -> Self {
        self.on_wait_start = Some(hook);
        self
    }

    pub fn on_wait_end(mut self, hook: WaitHook) -> Self {
        self.on_wait_end = Some(hook);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn ProcessProbe>) -> Self {
        self.probe = probe;
        self
    }
}

/// Well-known shared lock location under the user state directory.
pub fn default_lock_path() -> PathBuf {
    dirs::state_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("lintfleet")
        .join("engine.lock")
}

/// Held lock handle. Released explicitly, on drop, or by the signal
/// cleanup task, whichever comes first.
pub struct ExecutionLock {
    path: PathBuf,
    released: Arc<AtomicBool>,
    signal_task: Option<tokio::task::JoinHandle<()>>,
}

impl ExecutionLock {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the lock file. Idempotent; a second call is a no-op.
    ///
    /// Deregisters the signal cleanup task so the file cannot be
    /// double-released. Unlink failures other than "already gone"
    /// propagate.
    pub fn release(&mut self) -> Result<(), LockError> {
        if self.released.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(task) = self.signal_task.take() {
            task.abort();
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LockError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl Drop for ExecutionLock {
    fn drop(&mut self) {
        if let Some(task) = self.signal_task.take() {
            task.abort();
        }
        if !self.released.swap(true, Ordering::SeqCst) {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), error = %e, "failed to remove lock file on drop");
                }
            }
        }
    }
}

/// Acquire the cross-process execution lock.
///
/// Attempts an exclusive create-only write of the pid record. A stale
/// holder (dead pid or corrupt record) is reclaimed and retried
/// immediately; a live holder triggers the bounded poll loop. At most
/// one live, valid holder exists per path at any time.
pub async fn acquire(opts: LockOptions) -> Result<ExecutionLock, LockError> {
    if let Some(parent) = opts.lock_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| LockError::Create {
            path: opts.lock_path.clone(),
            source,
        })?;
    }

    let mut waited = false;
    loop {
        match try_create(&opts.lock_path) {
            Ok(()) => {
                if waited {
                    if let Some(hook) = &opts.on_wait_end {
                        hook();
                    }
                }
                tracing::debug!(path = %opts.lock_path.display(), "execution lock acquired");
                return Ok(install(opts.lock_path));
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                if holder_is_stale(&opts.lock_path, opts.probe.as_ref())? {
                    tracing::warn!(
                        path = %opts.lock_path.display(),
                        "reclaiming stale execution lock"
                    );
                    remove_stale(&opts.lock_path)?;
                    continue;
                }
                if !waited {
                    waited = true;
                    if let Some(hook) = &opts.on_wait_start {
                        hook();
                    }
                    tracing::info!(
                        path = %opts.lock_path.display(),
                        "execution lock held by a live process, waiting"
                    );
                }
                tokio::time::sleep(opts.poll_interval).await;
            }
            Err(source) => {
                return Err(LockError::Create {
                    path: opts.lock_path.clone(),
                    source,
                })
            }
        }
    }
}

/// Exclusive create-only write of the pid record.
fn try_create(path: &Path) -> std::io::Result<()> {
    let record = LockRecord {
        pid: std::process::id(),
        created_at: std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64,
    };
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    let body = serde_json::to_vec(&record).map_err(std::io::Error::other)?;
    file.write_all(&body)
}

/// True when the recorded holder is dead or the record is corrupt.
///
/// A vanished file counts as stale (the holder released between our
/// create attempt and this read). Read failures other than NotFound
/// are fatal.
fn holder_is_stale(path: &Path, probe: &dyn ProcessProbe) -> Result<bool, LockError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(source) => {
            return Err(LockError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let record: LockRecord = match serde_json::from_str(&contents) {
        Ok(r) => r,
        Err(_) => return Ok(true),
    };
    if record.pid == 0 {
        return Ok(true);
    }
    Ok(!probe.is_alive(record.pid))
}

/// Delete a stale lock file, tolerating a concurrent reclaim.
fn remove_stale(path: &Path) -> Result<(), LockError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(LockError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Build the handle and start the signal cleanup task.
fn install(path: PathBuf) -> ExecutionLock {
    let released = Arc::new(AtomicBool::new(false));
    let signal_task = Some(tokio::spawn(watch_signals(
        path.clone(),
        Arc::clone(&released),
    )));
    ExecutionLock {
        path,
        released,
        signal_task,
    }
}

/// Release the lock on SIGTERM/SIGINT and terminate with the
/// conventional `128 + signo` status, forwarding the interruption to
/// the caller's supervisor. The workspace forbids `unsafe`, so the
/// default-disposition re-raise is emulated by exit status.
async fn watch_signals(path: PathBuf, released: Arc<AtomicBool>) {
    let (mut term, mut int) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(t), Ok(i)) => (t, i),
        _ => {
            tracing::warn!("failed to install signal handlers for lock cleanup");
            return;
        }
    };
    let signo = tokio::select! {
        _ = term.recv() => 15,
        _ = int.recv() => 2,
    };
    if !released.swap(true, Ordering::SeqCst) {
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "failed to remove lock file during signal cleanup"
                );
            }
        }
    }
    std::process::exit(128 + signo);
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
