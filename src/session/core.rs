//! Core Session struct, attachment and event routing.

use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::process::Child;
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::identifiers::{TargetId, TargetSessionId};
use crate::protocol::{Command, Event, PageCommand, ParsedEvent, RuntimeCommand, TargetCommand};
use crate::transport::Connection;

use super::binding::{self, BoundFunction};
use super::builder::SessionBuilder;
use super::lifecycle::{self, ExitReason};

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a session.
pub(crate) struct SessionInner {
    /// Unique identifier for this session (logging only).
    pub uuid: Uuid,
    /// WebSocket connection.
    pub connection: Connection,
    /// Attached page session, unset when talking to a page endpoint directly.
    target: OnceLock<TargetSessionId>,
    /// Bound functions by page-visible name.
    pub bindings: Mutex<FxHashMap<String, BoundFunction>>,
    /// Count of `Page.loadEventFired` events seen.
    pub loads: watch::Sender<u64>,
    /// Termination request for the lifecycle monitor.
    kill_tx: Mutex<Option<oneshot::Sender<()>>>,
    /// Set once the session is terminated.
    done: watch::Receiver<Option<ExitReason>>,
    /// Browser process ID, if this session spawned it.
    pid: Option<u32>,
}

// ============================================================================
// Session
// ============================================================================

/// A handle to one browser engine and its attached page.
///
/// Cloning is cheap; all clones share the same connection, pending
/// requests and bindings. When the last clone is dropped the session is
/// terminated and an owned browser process is killed.
///
/// # Example
///
/// ```no_run
/// use devtools_bridge::Session;
///
/// # async fn example() -> devtools_bridge::Result<()> {
/// let session = Session::connect("ws://127.0.0.1:9222/devtools/browser/abc").await?;
/// session.load("data:text/html,<h1>Hello</h1>").await?;
/// let sum = session.evaluate("2 + 3").await?;
/// assert_eq!(sum, "5");
/// session.kill().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Session {
    pub(crate) inner: Arc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("uuid", &self.inner.uuid)
            .field("target", &self.inner.target.get())
            .field("pid", &self.inner.pid)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Session - Constructors
// ============================================================================

impl Session {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Connects to a running engine with default settings.
    ///
    /// Accepts a browser endpoint (`/devtools/browser/…`), which attaches to
    /// the first page, or a page endpoint (`/devtools/page/…`).
    pub async fn connect(ws_url: &str) -> Result<Self> {
        SessionBuilder::new().connect(ws_url).await
    }

    /// Starts a session over an open connection.
    ///
    /// Installs event routing, starts the lifecycle monitor, attaches to a
    /// page (unless `attach` is false) and enables the Page and Runtime
    /// domains. On failure the session is terminated before returning.
    pub(crate) async fn start(
        connection: Connection,
        child: Option<Child>,
        attach: bool,
    ) -> Result<Self> {
        let (kill_tx, kill_rx) = oneshot::channel();
        let (done_tx, done_rx) = watch::channel(None);
        let pid = child.as_ref().and_then(Child::id);

        let inner = Arc::new(SessionInner {
            uuid: Uuid::new_v4(),
            connection: connection.clone(),
            target: OnceLock::new(),
            bindings: Mutex::new(FxHashMap::default()),
            loads: watch::Sender::new(0),
            kill_tx: Mutex::new(Some(kill_tx)),
            done: done_rx,
            pid,
        });

        let weak: Weak<SessionInner> = Arc::downgrade(&inner);
        connection.set_event_handler(Box::new(move |event| {
            if let Some(inner) = weak.upgrade() {
                Session { inner }.dispatch(event);
            }
        }));

        tokio::spawn(lifecycle::monitor(child, kill_rx, connection, done_tx));

        let session = Self { inner };
        if let Err(e) = session.prepare(attach).await {
            warn!(error = %e, "Session setup failed");
            session.kill().await;
            return Err(e);
        }

        info!(uuid = %session.inner.uuid, pid, "Session ready");
        Ok(session)
    }

    /// Attaches to a page and enables the domains the bridge relies on.
    async fn prepare(&self, attach: bool) -> Result<()> {
        if attach {
            let target_id = self.find_page_target().await?;
            let attached = self
                .inner
                .connection
                .call(
                    Command::Target(TargetCommand::AttachToTarget {
                        target_id: target_id.clone(),
                        flatten: true,
                    }),
                    None,
                )
                .await?;
            let session_id = attached
                .get("sessionId")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::protocol("Expected sessionId in attachToTarget reply"))?;
            let _ = self.inner.target.set(TargetSessionId::new(session_id));
            debug!(target_id = %target_id, session_id, "Attached to page target");
        }

        self.send_command(Command::Page(PageCommand::Enable)).await?;
        self.send_command(Command::Runtime(RuntimeCommand::Enable))
            .await?;
        Ok(())
    }

    /// Returns the first page target, creating one if none exists.
    async fn find_page_target(&self) -> Result<TargetId> {
        let targets = self
            .inner
            .connection
            .call(Command::Target(TargetCommand::GetTargets), None)
            .await?;

        let existing = targets
            .get("targetInfos")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .find(|info| info.get("type").and_then(Value::as_str) == Some("page"))
            .and_then(|info| info.get("targetId").and_then(Value::as_str));

        if let Some(target_id) = existing {
            return Ok(TargetId::new(target_id));
        }

        debug!("No page target found, creating one");
        let created = self
            .inner
            .connection
            .call(
                Command::Target(TargetCommand::CreateTarget {
                    url: "about:blank".to_string(),
                }),
                None,
            )
            .await?;
        created
            .get("targetId")
            .and_then(Value::as_str)
            .map(TargetId::new)
            .ok_or_else(|| Error::protocol("Expected targetId in createTarget reply"))
    }
}

// ============================================================================
// Session - Accessors
// ============================================================================

impl Session {
    /// Returns the Rust-side unique UUID.
    #[inline]
    #[must_use]
    pub fn uuid(&self) -> &Uuid {
        &self.inner.uuid
    }

    /// Returns the browser process ID, if this session spawned it.
    #[inline]
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.inner.pid
    }

    /// Returns the attached target session, if any.
    #[inline]
    #[must_use]
    pub fn target_session(&self) -> Option<&TargetSessionId> {
        self.inner.target.get()
    }

    /// Returns the number of requests awaiting a reply.
    #[inline]
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.inner.connection.pending_count()
    }
}

// ============================================================================
// Session - Lifecycle
// ============================================================================

impl Session {
    /// Terminates the session.
    ///
    /// Closes the connection, kills an owned browser process and waits
    /// until termination is complete. Every pending call fails with
    /// [`Error::SessionClosed`]. Safe to call repeatedly.
    pub async fn kill(&self) {
        debug!(uuid = %self.inner.uuid, "Killing session");
        self.inner.request_termination();
        self.done().await;
    }

    /// Waits until the session is terminated and returns why.
    pub async fn done(&self) -> ExitReason {
        let mut done = self.inner.done.clone();
        match done.wait_for(Option::is_some).await {
            Ok(reason) => reason.unwrap_or(ExitReason::Killed),
            // Monitor gone without publishing; only happens on runtime shutdown.
            Err(_) => ExitReason::Killed,
        }
    }

    /// Returns `true` once the session is terminated.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.done.borrow().is_some()
    }
}

impl SessionInner {
    /// Asks the lifecycle monitor to terminate the session.
    fn request_termination(&self) {
        if let Some(kill_tx) = self.kill_tx.lock().take() {
            let _ = kill_tx.send(());
        }
    }
}

// ============================================================================
// Session - Internal
// ============================================================================

impl Session {
    /// Sends a command addressed to the attached page.
    pub(crate) async fn send_command(&self, command: Command) -> Result<Value> {
        self.inner
            .connection
            .call(command, self.inner.target.get().cloned())
            .await
    }

    /// Sends an arbitrary protocol method to the attached page.
    ///
    /// Low-level escape hatch over the correlator; prefer the typed
    /// operations.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.send_command(Command::raw(method, params)).await
    }

    /// Routes an unsolicited event.
    fn dispatch(&self, event: Event) {
        if let (Some(ours), Some(theirs)) = (self.inner.target.get(), event.session_id.as_ref())
            && ours != theirs
        {
            trace!(method = %event.method, "Ignoring event for another target");
            return;
        }

        match event.parse() {
            ParsedEvent::BindingCalled { name, payload, .. } => {
                binding::dispatch(self.clone(), name, payload);
            }

            ParsedEvent::LoadEventFired => {
                self.inner.loads.send_modify(|count| *count += 1);
                debug!(uuid = %self.inner.uuid, "Page loaded");
            }

            ParsedEvent::FrameNavigated {
                parent_id: None,
                url,
                ..
            } => {
                debug!(uuid = %self.inner.uuid, url = %url, "Main frame navigated");
            }

            ParsedEvent::ConsoleApiCalled { kind, args } => {
                debug!(kind = %kind, message = %args.join(" "), "Page console");
            }

            ParsedEvent::ExceptionThrown { text, description } => {
                warn!(
                    text = %text,
                    description = description.as_deref().unwrap_or_default(),
                    "Uncaught page exception"
                );
            }

            ParsedEvent::TargetCrashed => {
                warn!(uuid = %self.inner.uuid, "Page crashed");
                self.inner.request_termination();
            }

            ParsedEvent::DetachedFromTarget { session_id } => {
                if session_id.as_ref() == self.inner.target.get() {
                    warn!(uuid = %self.inner.uuid, "Detached from page target");
                    self.inner.request_termination();
                }
            }

            other => trace!(event = ?other, "Unhandled event"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
