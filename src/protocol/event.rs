//! Event message types.
//!
//! Events are notifications sent by the engine without a matching request.
//!
//! # Event Types
//!
//! | Domain | Events |
//! |--------|--------|
//! | `Runtime` | `bindingCalled`, `consoleAPICalled`, `exceptionThrown`, `executionContextsCleared` |
//! | `Page` | `loadEventFired`, `domContentEventFired`, `frameNavigated` |
//! | `Inspector` | `targetCrashed` |
//! | `Target` | `detachedFromTarget` |

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::identifiers::TargetSessionId;

// ============================================================================
// Event
// ============================================================================

/// An event notification from the engine.
///
/// # Format
///
/// ```json
/// {
///   "method": "Domain.eventName",
///   "params": { ... },
///   "sessionId": "6A1F..."
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Event name in `Domain.eventName` format.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Value,

    /// Target session the event belongs to.
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<TargetSessionId>,
}

impl Event {
    /// Returns the domain name from the method.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let event = Event { method: "Page.loadEventFired".into(), .. };
    /// assert_eq!(event.domain(), "Page");
    /// ```
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns the event name from the method.
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.method.split('.').nth(1).unwrap_or_default()
    }

    /// Parses the event into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedEvent {
        self.parse_internal()
    }
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Parsed event types for type-safe handling.
#[derive(Debug, Clone)]
pub enum ParsedEvent {
    /// Page script called a native binding.
    BindingCalled {
        /// Binding name.
        name: String,
        /// String argument passed to the binding.
        payload: String,
        /// Execution context the call came from.
        execution_context_id: i64,
    },

    /// Page `load` event.
    LoadEventFired,

    /// Page `DOMContentLoaded` event.
    DomContentEventFired,

    /// A frame committed a navigation.
    FrameNavigated {
        /// Frame ID.
        frame_id: String,
        /// Parent frame ID (None for the main frame).
        parent_id: Option<String>,
        /// New frame URL.
        url: String,
    },

    /// All execution contexts were destroyed.
    ExecutionContextsCleared,

    /// Page called a `console` method.
    ConsoleApiCalled {
        /// Console method (`log`, `warning`, `error`, ...).
        kind: String,
        /// Rendered arguments.
        args: Vec<String>,
    },

    /// Uncaught exception in the page.
    ExceptionThrown {
        /// Short exception text.
        text: String,
        /// Exception description, usually with a stack.
        description: Option<String>,
    },

    /// The renderer crashed.
    TargetCrashed,

    /// A target session was detached.
    DetachedFromTarget {
        /// Session that was detached.
        session_id: Option<TargetSessionId>,
    },

    /// Unknown event type.
    Unknown {
        /// Event method.
        method: String,
        /// Event params.
        params: Value,
    },
}

// ============================================================================
// Event Parsing Implementation
// ============================================================================

impl Event {
    /// Internal parsing implementation.
    fn parse_internal(&self) -> ParsedEvent {
        match self.method.as_str() {
            "Runtime.bindingCalled" => ParsedEvent::BindingCalled {
                name: self.get_string("name"),
                payload: self.get_string("payload"),
                execution_context_id: self
                    .params
                    .get("executionContextId")
                    .and_then(|v| v.as_i64())
                    .unwrap_or_default(),
            },

            "Page.loadEventFired" => ParsedEvent::LoadEventFired,

            "Page.domContentEventFired" => ParsedEvent::DomContentEventFired,

            "Page.frameNavigated" => {
                let frame = self.params.get("frame").unwrap_or(&Value::Null);
                ParsedEvent::FrameNavigated {
                    frame_id: str_field(frame, "id").unwrap_or_default(),
                    parent_id: str_field(frame, "parentId"),
                    url: str_field(frame, "url").unwrap_or_default(),
                }
            }

            "Runtime.executionContextsCleared" => ParsedEvent::ExecutionContextsCleared,

            "Runtime.consoleAPICalled" => ParsedEvent::ConsoleApiCalled {
                kind: self.get_string("type"),
                args: self
                    .params
                    .get("args")
                    .and_then(|v| v.as_array())
                    .map(|args| args.iter().map(render_remote_object).collect())
                    .unwrap_or_default(),
            },

            "Runtime.exceptionThrown" => {
                let details = self
                    .params
                    .get("exceptionDetails")
                    .unwrap_or(&Value::Null);
                ParsedEvent::ExceptionThrown {
                    text: str_field(details, "text").unwrap_or_default(),
                    description: details
                        .get("exception")
                        .and_then(|e| str_field(e, "description")),
                }
            }

            "Inspector.targetCrashed" => ParsedEvent::TargetCrashed,

            "Target.detachedFromTarget" => ParsedEvent::DetachedFromTarget {
                session_id: str_field(&self.params, "sessionId").map(TargetSessionId::new),
            },

            _ => ParsedEvent::Unknown {
                method: self.method.clone(),
                params: self.params.clone(),
            },
        }
    }

    /// Gets a string from params.
    #[inline]
    fn get_string(&self, key: &str) -> String {
        str_field(&self.params, key).unwrap_or_default()
    }
}

/// Gets an optional string field from a JSON object.
#[inline]
fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// Renders a `Runtime.RemoteObject` for logging.
fn render_remote_object(object: &Value) -> String {
    match object.get("value") {
        Some(Value::String(s)) => s.clone(),
        Some(value) => value.to_string(),
        None => str_field(object, "description")
            .or_else(|| str_field(object, "unserializableValue"))
            .or_else(|| str_field(object, "type"))
            .unwrap_or_default(),
    }
}

// ============================================================================
// Tests
// ============================================================================
