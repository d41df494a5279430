//! Page session: evaluation, navigation and the function bridge.
//!
//! A [`Session`] owns one DevTools connection, an optional browser
//! process, and every binding registered on its page.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Session struct, attachment, event routing |
//! | `builder` | [`SessionBuilder`] for timeouts and spawning |
//! | `lifecycle` | Termination monitor and [`ExitReason`] |
//! | `evaluate` | `Runtime.evaluate` and result unwrapping |
//! | `navigation` | `Page.navigate` and load waiting |
//! | `binding` | Host functions exposed to the page |
//! | `function` | Page functions held by the host |
//! | `script` | Page-side script builders |

// ============================================================================
// Submodules
// ============================================================================

mod binding;
mod builder;
mod core;
mod evaluate;
mod function;
mod lifecycle;
mod navigation;
mod script;

// ============================================================================
// Re-exports
// ============================================================================

pub use binding::BindingCall;
pub use builder::SessionBuilder;
pub use core::Session;
pub use function::FunctionHandle;
pub use lifecycle::ExitReason;
pub use navigation::html_data_url;
