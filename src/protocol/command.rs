//! DevTools commands organized by domain.
//!
//! Commands follow the `Domain.methodName` format.
//!
//! # Command Domains
//!
//! | Domain | Commands |
//! |--------|----------|
//! | `Target` | Target discovery and attachment |
//! | `Page` | Navigation, new-document scripts |
//! | `Runtime` | Evaluation, bindings |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::TargetId;

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by domain.
///
/// This enum wraps domain-specific command enums for unified serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    /// Target domain commands.
    Target(TargetCommand),
    /// Page domain commands.
    Page(PageCommand),
    /// Runtime domain commands.
    Runtime(RuntimeCommand),
    /// Any other method with free-form params.
    Raw(RawCommand),
}

impl Command {
    /// Creates a command for an arbitrary method.
    #[inline]
    #[must_use]
    pub fn raw(method: impl Into<String>, params: Value) -> Self {
        Self::Raw(RawCommand {
            method: method.into(),
            params,
        })
    }

    /// Returns the protocol method name.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Target(c) => c.method(),
            Self::Page(c) => c.method(),
            Self::Runtime(c) => c.method(),
            Self::Raw(c) => &c.method,
        }
    }
}

// ============================================================================
// Target Commands
// ============================================================================

/// Target domain commands for locating and attaching to pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum TargetCommand {
    /// List all targets.
    #[serde(rename = "Target.getTargets")]
    GetTargets,

    /// Open a new page target.
    #[serde(rename = "Target.createTarget")]
    CreateTarget {
        /// Initial URL.
        url: String,
    },

    /// Attach to a target and obtain a session ID.
    #[serde(rename = "Target.attachToTarget")]
    AttachToTarget {
        /// Target to attach to.
        #[serde(rename = "targetId")]
        target_id: TargetId,
        /// Use flat session mode (`sessionId` on every message).
        flatten: bool,
    },
}

impl TargetCommand {
    fn method(&self) -> &'static str {
        match self {
            Self::GetTargets => "Target.getTargets",
            Self::CreateTarget { .. } => "Target.createTarget",
            Self::AttachToTarget { .. } => "Target.attachToTarget",
        }
    }
}

// ============================================================================
// Page Commands
// ============================================================================

/// Page domain commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum PageCommand {
    /// Enable page lifecycle events.
    #[serde(rename = "Page.enable")]
    Enable,

    /// Navigate the page.
    #[serde(rename = "Page.navigate")]
    Navigate {
        /// URL to navigate to (regular or `data:` URL).
        url: String,
    },

    /// Install a script that runs in every new document.
    #[serde(rename = "Page.addScriptToEvaluateOnNewDocument")]
    AddScriptToEvaluateOnNewDocument {
        /// Script source.
        source: String,
    },

    /// Remove a script installed by `AddScriptToEvaluateOnNewDocument`.
    #[serde(rename = "Page.removeScriptToEvaluateOnNewDocument")]
    RemoveScriptToEvaluateOnNewDocument {
        /// Identifier returned when the script was added.
        identifier: String,
    },
}

impl PageCommand {
    fn method(&self) -> &'static str {
        match self {
            Self::Enable => "Page.enable",
            Self::Navigate { .. } => "Page.navigate",
            Self::AddScriptToEvaluateOnNewDocument { .. } => {
                "Page.addScriptToEvaluateOnNewDocument"
            }
            Self::RemoveScriptToEvaluateOnNewDocument { .. } => {
                "Page.removeScriptToEvaluateOnNewDocument"
            }
        }
    }
}

// ============================================================================
// Runtime Commands
// ============================================================================

/// Runtime domain commands for evaluation and bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum RuntimeCommand {
    /// Enable runtime events (console, exceptions, bindings).
    #[serde(rename = "Runtime.enable")]
    Enable,

    /// Evaluate an expression in the page.
    #[serde(rename = "Runtime.evaluate")]
    Evaluate {
        /// JavaScript expression.
        expression: String,
        /// Wait for a returned promise to settle.
        #[serde(rename = "awaitPromise")]
        await_promise: bool,
        /// Return the value as JSON instead of an object reference.
        #[serde(rename = "returnByValue")]
        return_by_value: bool,
    },

    /// Expose a native binding function on `window`.
    #[serde(rename = "Runtime.addBinding")]
    AddBinding {
        /// Binding name.
        name: String,
    },

    /// Remove a native binding function.
    #[serde(rename = "Runtime.removeBinding")]
    RemoveBinding {
        /// Binding name.
        name: String,
    },
}

impl RuntimeCommand {
    /// Creates an evaluate command that awaits promises and returns by value.
    #[inline]
    #[must_use]
    pub fn evaluate(expression: impl Into<String>) -> Self {
        Self::Evaluate {
            expression: expression.into(),
            await_promise: true,
            return_by_value: true,
        }
    }

    fn method(&self) -> &'static str {
        match self {
            Self::Enable => "Runtime.enable",
            Self::Evaluate { .. } => "Runtime.evaluate",
            Self::AddBinding { .. } => "Runtime.addBinding",
            Self::RemoveBinding { .. } => "Runtime.removeBinding",
        }
    }
}

// ============================================================================
// RawCommand
// ============================================================================

/// Free-form command for methods without a typed variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCommand {
    /// Method name in `Domain.method` format.
    pub method: String,
    /// Method params.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

// ============================================================================
// Tests
// ============================================================================
