//! Page navigation.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{Command, PageCommand};

use super::Session;

// ============================================================================
// Session - Navigation
// ============================================================================

impl Session {
    /// Navigates the page to `url`.
    ///
    /// Returns once the engine accepts the navigation; the document may
    /// still be loading. Use [`load_and_wait`](Self::load_and_wait) to wait
    /// for the load event.
    ///
    /// # Errors
    ///
    /// - [`Error::Navigation`] if the engine reports a navigation error
    /// - [`Error::SessionClosed`] if the session terminates first
    pub async fn load(&self, url: &str) -> Result<()> {
        debug!(uuid = %self.inner.uuid, url, "Navigating");
        let reply = self
            .send_command(Command::Page(PageCommand::Navigate {
                url: url.to_string(),
            }))
            .await?;

        match reply.get("errorText").and_then(Value::as_str) {
            Some(error_text) if !error_text.is_empty() => {
                Err(Error::navigation(url, error_text))
            }
            _ => Ok(()),
        }
    }

    /// Navigates to `url` and waits for the page's load event.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if the load event does not fire within `timeout`
    /// - [`Error::SessionClosed`] if the session terminates while waiting
    /// - any error of [`load`](Self::load)
    pub async fn load_and_wait(&self, url: &str, timeout: Duration) -> Result<()> {
        let mut loads = self.inner.loads.subscribe();
        loads.mark_unchanged();

        self.load(url).await?;

        let loaded = async {
            tokio::select! {
                changed = loads.changed() => changed.map_err(|_| Error::SessionClosed),
                _ = self.done() => Err(Error::SessionClosed),
            }
        };

        match tokio::time::timeout(timeout, loaded).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(
                format!("load event for {url}"),
                timeout.as_millis() as u64,
            )),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Builds a `data:text/html` URL for inline page content.
///
/// # Example
///
/// ```
/// use devtools_bridge::html_data_url;
///
/// assert_eq!(html_data_url("<b>hi</b>"), "data:text/html,%3Cb%3Ehi%3C%2Fb%3E");
/// ```
#[must_use]
pub fn html_data_url(html: &str) -> String {
    format!("data:text/html,{}", urlencoding::encode(html))
}

// ============================================================================
// Tests
// ============================================================================
