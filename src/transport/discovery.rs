//! DevTools endpoint discovery.
//!
//! A browser started with `--remote-debugging-port` prints the endpoint it
//! listens on to stderr:
//!
//! ```text
//! DevTools listening on ws://127.0.0.1:38547/devtools/browser/3b2c...
//! ```
//!
//! # Discovery Flow
//!
//! 1. Read stderr line by line until the banner appears (with timeout)
//! 2. Return the WebSocket URL
//! 3. Keep draining stderr in the background so the child never blocks

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::time::timeout;
use tracing::{debug, trace};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Banner printed by the engine once the endpoint is ready.
static BANNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^DevTools listening on (ws://\S+)\s*$").expect("banner pattern is valid")
});

// ============================================================================
// Functions
// ============================================================================

/// Extracts the WebSocket URL from a single stderr line.
#[must_use]
pub fn parse_banner(line: &str) -> Option<&str> {
    BANNER
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Waits for the DevTools banner on `stderr`.
///
/// Lines that are not the banner are logged at `trace`. Once the banner is
/// found, the rest of the stream is drained by a background task.
///
/// # Errors
///
/// - [`Error::ConnectionTimeout`] if no banner arrives within `wait`
/// - [`Error::Connection`] if the stream ends before the banner
/// - [`Error::Io`] if reading fails
pub async fn discover_endpoint<R>(stderr: R, wait: Duration) -> Result<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(stderr).lines();

    let ws_url = timeout(wait, read_banner(&mut lines))
        .await
        .map_err(|_| Error::connection_timeout(wait.as_millis() as u64))??;

    debug!(url = %ws_url, "DevTools endpoint discovered");

    tokio::spawn(async move {
        while let Ok(Some(line)) = lines.next_line().await {
            trace!(line = %line, "browser stderr");
        }
    });

    Ok(ws_url)
}

/// Reads lines until one matches the banner.
async fn read_banner<R>(lines: &mut Lines<BufReader<R>>) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        if let Some(url) = parse_banner(&line) {
            return Ok(url.to_string());
        }
        trace!(line = %line, "browser stderr");
    }
    Err(Error::connection(
        "browser exited before announcing a DevTools endpoint",
    ))
}

// ============================================================================
// Tests
// ============================================================================
