//! Error types for the DevTools bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use devtools_bridge::{Result, Session};
//!
//! async fn example(session: &Session) -> Result<()> {
//!     let sum = session.evaluate("2 + 3").await?;
//!     assert_eq!(sum.as_str(), "5");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::ProcessLaunchFailed`] |
//! | Transport | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::SessionClosed`] |
//! | Protocol | [`Error::Protocol`], [`Error::Engine`], [`Error::RequestTimeout`], [`Error::Timeout`] |
//! | Evaluation | [`Error::Syntax`], [`Error::Navigation`] |
//! | Bridge | [`Error::Handler`], [`Error::InvalidArgument`], [`Error::BindingExists`], [`Error::BindingNotFound`], [`Error::FunctionReleased`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::RequestId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when a session is configured with an unusable endpoint.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Failed to launch the engine process.
    #[error("Failed to launch browser: {message}")]
    ProcessLaunchFailed {
        /// Description of the launch failure.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// WebSocket connection failed.
    ///
    /// Returned when the debugging endpoint cannot be reached or discovered.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Timeout waiting for the engine to announce its endpoint.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The session is terminated.
    ///
    /// Returned for calls made after termination and for every call that
    /// was still pending when the session closed.
    #[error("Session closed")]
    SessionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Malformed or unexpected reply shape.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// The engine answered a command with an error object.
    #[error("{message}")]
    Engine {
        /// Protocol error code.
        code: i64,
        /// Error text reported by the engine.
        message: String,
    },

    /// Operation timeout.
    ///
    /// Returned when waiting for a page condition exceeds its deadline.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Command request timeout.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Evaluation Errors
    // ========================================================================
    /// Expression failed to parse.
    ///
    /// The message is the engine's text verbatim, e.g.
    /// `SyntaxError: Unexpected end of input`.
    #[error("{message}")]
    Syntax {
        /// Parse error text from the engine.
        message: String,
    },

    /// Navigation was rejected by the engine.
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// Requested URL.
        url: String,
        /// Engine error text (e.g. `net::ERR_NAME_NOT_RESOLVED`).
        message: String,
    },

    // ========================================================================
    // Bridge Errors
    // ========================================================================
    /// A bound handler failed.
    ///
    /// Delivered to the page as a rejection of the call's promise.
    #[error("{message}")]
    Handler {
        /// Handler error text.
        message: String,
    },

    /// Invalid argument passed to a bound function.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// A binding with this name already exists in the session.
    #[error("Binding already exists: {name}")]
    BindingExists {
        /// Page-visible binding name.
        name: String,
    },

    /// No binding with this name exists in the session.
    #[error("Binding not found: {name}")]
    BindingNotFound {
        /// Page-visible binding name.
        name: String,
    },

    /// The page-side function was already released.
    #[error("Function {binding_name}#{seq} was released")]
    FunctionReleased {
        /// Binding the function was passed through.
        binding_name: String,
        /// Page-side sequence number.
        seq: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a process launch failed error.
    #[inline]
    pub fn process_launch_failed(err: IoError) -> Self {
        Self::ProcessLaunchFailed {
            message: err.to_string(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an engine error from a reply's error object.
    #[inline]
    pub fn engine(code: i64, message: impl Into<String>) -> Self {
        Self::Engine {
            code,
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }

    /// Creates a syntax error.
    #[inline]
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    /// Creates a navigation error.
    #[inline]
    pub fn navigation(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a handler error.
    ///
    /// Bound handlers use this to reject a page call with a message.
    #[inline]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a binding exists error.
    #[inline]
    pub fn binding_exists(name: impl Into<String>) -> Self {
        Self::BindingExists { name: name.into() }
    }

    /// Creates a binding not found error.
    #[inline]
    pub fn binding_not_found(name: impl Into<String>) -> Self {
        Self::BindingNotFound { name: name.into() }
    }

    /// Creates a function released error.
    #[inline]
    pub fn function_released(binding_name: impl Into<String>, seq: u64) -> Self {
        Self::FunctionReleased {
            binding_name: binding_name.into(),
            seq,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout { .. } | Self::Timeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is a transport error.
    ///
    /// Transport errors are fatal to the session.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::SessionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is scoped to a single call.
    ///
    /// The session keeps running and the caller may retry.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Syntax { .. }
                | Self::Engine { .. }
                | Self::Protocol { .. }
                | Self::Timeout { .. }
                | Self::RequestTimeout { .. }
                | Self::Navigation { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
