//! DevTools protocol message types.
//!
//! This module defines the JSON messages exchanged with the engine's
//! remote-debugging endpoint.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Host → Engine | Command with `id`, `method`, `params` |
//! | `Response` | Engine → Host | Reply with `id` and `result` or `error` |
//! | `Event` | Engine → Host | Notification with `method` and `params` |
//!
//! # Command Naming
//!
//! Commands follow `Domain.methodName` format:
//!
//! - `Runtime.evaluate`
//! - `Page.navigate`
//! - `Runtime.addBinding`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Command definitions by domain |
//! | `event` | Event types |
//! | `request` | Request, Response and Incoming types |

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions organized by domain.
pub mod command;

/// Event message types.
pub mod event;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, PageCommand, RawCommand, RuntimeCommand, TargetCommand};
pub use event::{Event, ParsedEvent};
pub use request::{Incoming, Request, Response, ResponseError};
