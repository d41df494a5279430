//! WebSocket transport layer.
//!
//! This module handles communication between the host (Rust) and the
//! browser engine's remote-debugging endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Session (Rust) │                              │  Browser        │
//! │                 │         WebSocket            │                 │
//! │  Connection     │◄────────────────────────────►│  DevTools       │
//! │  (event loop)   │   ws://127.0.0.1:PORT/...    │  endpoint       │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `discover_endpoint` - Read the WebSocket URL from the browser's stderr
//! 2. `Connection::connect` - Open the WebSocket and start the event loop
//! 3. `Connection::call` - Send commands, receive replies/events
//! 4. `Connection::shutdown` - Close; pending calls fail with `SessionClosed`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |
//! | `discovery` | DevTools banner parsing |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// DevTools endpoint discovery.
pub mod discovery;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, EventHandler};
pub use discovery::{discover_endpoint, parse_banner};
