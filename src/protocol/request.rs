//! Request, Response and inbound message types.
//!
//! Defines the framing of commands sent to the engine and of the messages
//! it sends back.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::{RequestId, TargetSessionId};

use super::{Command, Event};

// ============================================================================
// Request
// ============================================================================

/// A command request from the host to the engine.
///
/// # Format
///
/// ```json
/// {
///   "id": 7,
///   "sessionId": "6A1F...",
///   "method": "Domain.methodName",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Identifier for request/response correlation.
    pub id: RequestId,

    /// Attached target session, absent for browser-level commands.
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<TargetSessionId>,

    /// Command with method and params.
    #[serde(flatten)]
    pub command: Command,
}

impl Request {
    /// Creates a new request.
    #[inline]
    #[must_use]
    pub fn new(id: RequestId, session_id: Option<TargetSessionId>, command: Command) -> Self {
        Self {
            id,
            session_id,
            command,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A reply from the engine.
///
/// # Format
///
/// Success:
/// ```json
/// { "id": 7, "result": { ... } }
/// ```
///
/// Error:
/// ```json
/// { "id": 7, "error": { "code": -32000, "message": "..." } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Matches the request `id`.
    pub id: RequestId,

    /// Result data (if success).
    #[serde(default)]
    pub result: Option<Value>,

    /// Error object (if error).
    #[serde(default)]
    pub error: Option<ResponseError>,

    /// Target session the reply belongs to.
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<TargetSessionId>,
}

/// Error object in a reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseError {
    /// Protocol error code.
    pub code: i64,
    /// Error text.
    pub message: String,
    /// Optional detail.
    #[serde(default)]
    pub data: Option<Value>,
}

impl Response {
    /// Returns `true` if the engine reported an error.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Extracts the result value, returning error if the reply was an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Engine`] carrying the engine's error text.
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(error) => Err(Error::engine(error.code, error.message)),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

// ============================================================================
// Incoming
// ============================================================================

/// Any message read from the engine.
///
/// Replies carry an `id`; unsolicited notifications only carry a `method`.
/// Payloads stay as JSON values until a consumer decodes them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Incoming {
    /// Reply to one of our requests.
    Reply(Response),
    /// Unsolicited notification.
    Event(Event),
}

// ============================================================================
// Tests
// ============================================================================
