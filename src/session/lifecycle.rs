//! Session termination monitor.
//!
//! One task per session watches three sources and terminates the session
//! on whichever fires first:
//!
//! - the browser process exits (only when the session spawned it)
//! - a kill is requested, or every [`Session`](super::Session) is dropped
//! - the connection stops
//!
//! Termination always runs the same steps: shut the connection down, kill
//! the process if it is still alive, wait for both, then publish the
//! [`ExitReason`].

use std::fmt;

use tokio::process::Child;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info};

use crate::transport::Connection;

// ============================================================================
// ExitReason
// ============================================================================

/// Why a session terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Terminated on request, or because every handle was dropped.
    Killed,
    /// The browser process exited on its own.
    ProcessExited {
        /// Exit code, if the process was not ended by a signal.
        code: Option<i32>,
    },
    /// The engine closed the connection.
    Disconnected,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Killed => f.write_str("killed"),
            Self::ProcessExited { code: Some(code) } => write!(f, "process exited with code {code}"),
            Self::ProcessExited { code: None } => f.write_str("process terminated by signal"),
            Self::Disconnected => f.write_str("connection closed"),
        }
    }
}

// ============================================================================
// ProcessGuard
// ============================================================================

/// Guards a child process and ensures it is killed when dropped.
struct ProcessGuard {
    /// The child process handle.
    child: Option<Child>,
    /// Process ID for logging.
    pid: u32,
}

impl ProcessGuard {
    fn new(child: Option<Child>) -> Self {
        let pid = child.as_ref().and_then(Child::id).unwrap_or(0);
        Self { child, pid }
    }

    /// Waits for the process to exit; pends forever without a process.
    async fn wait(&mut self) -> Option<i32> {
        match self.child.as_mut() {
            Some(child) => {
                let status = child.wait().await;
                self.child = None;
                match status {
                    Ok(status) => status.code(),
                    Err(e) => {
                        debug!(pid = self.pid, error = %e, "Failed to wait for process");
                        None
                    }
                }
            }
            None => std::future::pending().await,
        }
    }

    /// Kills the process and waits for it to exit.
    async fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!(pid = self.pid, "Killing browser process");
            if let Err(e) = child.kill().await {
                debug!(pid = self.pid, error = %e, "Failed to kill process");
            }
            info!(pid = self.pid, "Process terminated");
        }
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take()
            && let Err(e) = child.start_kill()
        {
            debug!(pid = self.pid, error = %e, "Failed to send kill signal in Drop");
        }
    }
}

// ============================================================================
// Monitor
// ============================================================================

/// Runs until the session terminates, then publishes the reason.
pub(crate) async fn monitor(
    child: Option<Child>,
    kill_rx: oneshot::Receiver<()>,
    connection: Connection,
    done_tx: watch::Sender<Option<ExitReason>>,
) {
    let mut process = ProcessGuard::new(child);

    let reason = tokio::select! {
        code = process.wait() => ExitReason::ProcessExited { code },
        // Err means every session handle was dropped.
        _ = kill_rx => ExitReason::Killed,
        () = connection.closed() => ExitReason::Disconnected,
    };

    debug!(reason = %reason, "Terminating session");

    connection.clear_event_handler();
    connection.shutdown();
    process.kill().await;
    connection.closed().await;

    info!(reason = %reason, "Session terminated");
    done_tx.send_replace(Some(reason));
}

// ============================================================================
// Tests
// ============================================================================
