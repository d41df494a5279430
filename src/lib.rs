//! DevTools Bridge - Drive a browser page and call across the host/page boundary.
//!
//! This library connects to a Chromium-family engine over its remote
//! debugging (DevTools) WebSocket and provides a small, bidirectional
//! function bridge between Rust and page script.
//!
//! # Architecture
//!
//! - **Host (Rust)**: Sends protocol commands, receives replies and events
//! - **Engine**: Executes script in the page, emits events
//!
//! Key design principles:
//!
//! - Each [`Session`] owns: browser process (optional) + WebSocket connection + event loop
//! - Replies are correlated to callers by per-connection request IDs
//! - Page calls into the host arrive as events and run on their own tasks
//! - Terminating a session fails every pending call with [`Error::SessionClosed`]
//!
//! # Quick Start
//!
//! ```no_run
//! use devtools_bridge::{Result, Session, html_data_url};
//! use tokio::process::Command;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut chrome = Command::new("/usr/bin/chromium");
//!     chrome.args(["--headless=new", "--remote-debugging-port=0", "about:blank"]);
//!     let session = Session::builder().spawn(chrome).await?;
//!
//!     // Host function callable from the page
//!     session
//!         .bind("add", |call| async move {
//!             Ok(call.arg::<i64>(0)? + call.arg::<i64>(1)?)
//!         })
//!         .await?;
//!
//!     session.load(&html_data_url("<h1>Hello</h1>")).await?;
//!     let sum = session.evaluate("window.add(2, 3)").await?;
//!     println!("2 + 3 = {}", sum);
//!
//!     session.kill().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`session`] | [`Session`], [`SessionBuilder`], [`BindingCall`], [`FunctionHandle`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`value`] | [`JsValue`], JSON text of page values |
//! | [`protocol`] | DevTools message types (internal) |
//! | [`transport`] | WebSocket transport layer (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Page sessions and the function bridge.
///
/// - [`Session`] - One engine connection and its page
/// - [`BindingCall`] - A page call into a bound host function
/// - [`FunctionHandle`] - A page function held by the host
pub mod session;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for protocol entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// DevTools protocol message types.
///
/// Internal module defining command/response/event structures.
pub mod protocol;

/// WebSocket transport layer.
///
/// Internal module handling the WebSocket connection and endpoint discovery.
pub mod transport;

/// JSON text of page values.
pub mod value;

// ============================================================================
// Re-exports
// ============================================================================

// Session types
pub use session::{
    BindingCall, ExitReason, FunctionHandle, Session, SessionBuilder, html_data_url,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{RequestId, TargetId, TargetSessionId};

// Value types
pub use value::JsValue;
