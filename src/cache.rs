//! Vulnerability database cache directory
//!
//! Every scanner container mounts the same cache directory so the vulnerability
//! database is downloaded once per run. A caller-supplied directory is used as
//! is and never deleted. Otherwise a temporary directory is created and removed
//! by whichever comes first:
//!
//! - dropping the [`CacheDir`] at the end of the run, or
//! - an interrupt/termination signal seen by [`CacheDir::watch_signals`], which
//!   also exits the process.
//!
//! Both paths go through one single-fire disposal token, so the directory is
//! removed at most once and the second trigger is a no-op.

use crate::error::ScanError;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const TEMP_PREFIX: &str = "chartscan-";

#[derive(Debug)]
struct DisposalToken {
    path: PathBuf,
    disposed: AtomicBool,
}

impl DisposalToken {
    /// Removes the directory on the first call, returns whether this call did it
    fn dispose(&self) -> io::Result<bool> {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e),
        }
    }
}

/// The cache directory of one invocation
#[derive(Debug)]
pub struct CacheDir {
    path: PathBuf,
    token: Option<Arc<DisposalToken>>,
}

impl CacheDir {
    /// Uses `explicit` when given and non-empty, otherwise creates a temp dir
    pub fn acquire(explicit: Option<&Path>) -> Result<Self, ScanError> {
        if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
            return Ok(Self {
                path: path.to_path_buf(),
                token: None,
            });
        }

        let dir = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir()
            .map_err(|source| ScanError::Cache {
                path: std::env::temp_dir(),
                source,
            })?;
        let path = dir.keep();
        debug!("Created temporary cache directory {}", path.display());

        Ok(Self {
            token: Some(Arc::new(DisposalToken {
                path: path.clone(),
                disposed: AtomicBool::new(false),
            })),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this run created the directory and will remove it
    pub fn is_owned(&self) -> bool {
        self.token.is_some()
    }

    /// Removes an owned directory; repeated calls and borrowed dirs are no-ops
    pub fn cleanup(&self) -> io::Result<()> {
        if let Some(token) = &self.token {
            if token.dispose()? {
                debug!("Removed cache directory {}", self.path.display());
            }
        }
        Ok(())
    }

    /// Spawns the watcher that removes an owned directory on SIGINT/SIGTERM and
    /// exits the process with `128 + signal`
    ///
    /// The signal handlers are installed before this returns, so a signal that
    /// arrives before the task first runs is still caught. Returns `None` for a
    /// caller-supplied directory. In-flight scans are abandoned when the signal
    /// fires. Must be called from within a tokio runtime.
    pub fn watch_signals(&self) -> io::Result<Option<JoinHandle<()>>> {
        let Some(token) = self.token.clone() else {
            return Ok(None);
        };
        let signals = TerminationSignals::install()?;

        Ok(Some(tokio::spawn(async move {
            let code = on_termination(token, signals.recv()).await;
            std::process::exit(code);
        })))
    }
}

/// Waits for `signal`, disposes of the directory and returns the exit code
async fn on_termination<F>(token: Arc<DisposalToken>, signal: F) -> i32
where
    F: Future<Output = i32>,
{
    let code = signal.await;
    debug!("Received termination signal, removing {}", token.path.display());
    if let Err(e) = token.dispose() {
        warn!(
            "Could not remove cache directory {}: {}",
            token.path.display(),
            e
        );
    }
    code
}

impl Drop for CacheDir {
    fn drop(&mut self) {
        if let Err(e) = self.cleanup() {
            warn!(
                "Could not remove cache directory {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Registered interrupt and termination handlers
#[cfg(unix)]
struct TerminationSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl TerminationSignals {
    fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(mut self) -> i32 {
        tokio::select! {
            _ = self.interrupt.recv() => 130,
            _ = self.terminate.recv() => 143,
        }
    }
}

#[cfg(windows)]
struct TerminationSignals {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(windows)]
impl TerminationSignals {
    fn install() -> io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    async fn recv(mut self) -> i32 {
        self.ctrl_c.recv().await;
        130
    }
}
