//! Builder pattern for session configuration.
//!
//! Provides a fluent API for opening [`Session`] instances, either over a
//! browser the caller already runs or by spawning a prepared command.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use devtools_bridge::Session;
//! use tokio::process::Command;
//!
//! # async fn example() -> devtools_bridge::Result<()> {
//! let mut chrome = Command::new("/usr/bin/chromium");
//! chrome.args(["--headless=new", "--remote-debugging-port=0", "about:blank"]);
//!
//! let session = Session::builder()
//!     .request_timeout(Duration::from_secs(10))
//!     .spawn(chrome)
//!     .await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};
use crate::transport::{Connection, discover_endpoint};

use super::core::Session;

// ============================================================================
// Constants
// ============================================================================

/// Default time to wait for the DevTools banner.
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Path prefix of page-level endpoints, which need no attach step.
const PAGE_ENDPOINT_PREFIX: &str = "/devtools/page/";

// ============================================================================
// SessionBuilder
// ============================================================================

/// Builder for configuring a [`Session`].
///
/// Use [`Session::builder()`] to create a new builder.
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    /// Per-request reply deadline; `None` waits indefinitely.
    request_timeout: Option<Duration>,
    /// How long a spawned browser may take to announce its endpoint.
    discovery_timeout: Duration,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            request_timeout: None,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }
}

// ============================================================================
// SessionBuilder Implementation
// ============================================================================

impl SessionBuilder {
    /// Creates a new builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails any request whose reply takes longer than `timeout`.
    #[inline]
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets how long [`spawn`](Self::spawn) waits for the DevTools banner.
    #[inline]
    #[must_use]
    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Connects to a running engine.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `ws_url` is not a WebSocket URL
    /// - [`Error::Connection`] if the handshake fails
    /// - [`Error::Engine`] if attaching or enabling domains is refused
    pub async fn connect(self, ws_url: &str) -> Result<Session> {
        let attach = !is_page_endpoint(ws_url)?;
        let connection = Connection::connect(ws_url)
            .await?
            .with_request_timeout(self.request_timeout);
        Session::start(connection, None, attach).await
    }

    /// Spawns a browser and connects to the endpoint it announces.
    ///
    /// `command` must enable remote debugging (for Chromium,
    /// `--remote-debugging-port=0`). Its stderr is piped for discovery and
    /// stdin/stdout are suppressed. The process is owned by the session and
    /// killed when the session terminates.
    ///
    /// # Errors
    ///
    /// - [`Error::ProcessLaunchFailed`] if the command cannot be spawned
    /// - [`Error::ConnectionTimeout`] if no endpoint is announced in time
    /// - any error of [`connect`](Self::connect)
    pub async fn spawn(self, mut command: Command) -> Result<Session> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(Error::process_launch_failed)?;
        let pid = child.id();
        info!(pid, "Browser process spawned");

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::connection("browser stderr is not captured"))?;

        // Dropping `child` on any early return kills the process.
        let ws_url = discover_endpoint(stderr, self.discovery_timeout).await?;
        let attach = !is_page_endpoint(&ws_url)?;
        debug!(pid, url = %ws_url, "Connecting to spawned browser");

        let connection = Connection::connect(&ws_url)
            .await?
            .with_request_timeout(self.request_timeout);
        Session::start(connection, Some(child), attach).await
    }
}

/// Returns `true` for `/devtools/page/…` endpoints.
fn is_page_endpoint(ws_url: &str) -> Result<bool> {
    let url = Url::parse(ws_url)
        .map_err(|e| Error::config(format!("Invalid endpoint URL {ws_url}: {e}")))?;
    Ok(url.path().starts_with(PAGE_ENDPOINT_PREFIX))
}

// ============================================================================
// Tests
// ============================================================================
