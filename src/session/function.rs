//! Page functions held by the host.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::error::{Error, Result};
use crate::value::JsValue;

use super::Session;
use super::script::{function_call_script, function_release_script};

// ============================================================================
// FunctionRef
// ============================================================================

/// Marker the page proxy substitutes for a function argument.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FunctionRef {
    pub binding_name: String,
    pub seq: u64,
}

// ============================================================================
// FunctionHandle
// ============================================================================

/// A page-side function passed to a bound host function.
///
/// The function stays alive in the page until [`release`](Self::release)
/// is called, so a handle may be called long after the binding call that
/// delivered it has returned. Clones share the released state.
#[derive(Clone)]
pub struct FunctionHandle {
    binding_name: String,
    seq: u64,
    session: Session,
    released: Arc<AtomicBool>,
}

impl fmt::Debug for FunctionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionHandle")
            .field("binding_name", &self.binding_name)
            .field("seq", &self.seq)
            .field("released", &self.is_released())
            .finish_non_exhaustive()
    }
}

impl FunctionHandle {
    pub(crate) fn new(session: Session, function: FunctionRef) -> Self {
        Self {
            binding_name: function.binding_name,
            seq: function.seq,
            session,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns the binding the function was passed through.
    #[inline]
    #[must_use]
    pub fn binding_name(&self) -> &str {
        &self.binding_name
    }

    /// Returns the page-side sequence number.
    #[inline]
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns `true` once the handle has been released.
    #[inline]
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Calls the page function and returns its result.
    ///
    /// `args` serializes to the argument list: a sequence is spread into
    /// positional arguments, `()` passes none, and any other value is
    /// passed as the single argument. Pass a one-element tuple such as
    /// `(vec![2, 3, 5],)` to hand over an array as one argument.
    ///
    /// # Errors
    ///
    /// - [`Error::FunctionReleased`] if the handle was released
    /// - any error of [`Session::evaluate`]
    pub async fn call(&self, args: impl Serialize) -> Result<JsValue> {
        if self.is_released() {
            return Err(Error::function_released(&self.binding_name, self.seq));
        }

        let spread = match serde_json::to_value(args)? {
            Value::Null => None,
            list @ Value::Array(_) => Some(list.to_string()),
            single => Some(Value::Array(vec![single]).to_string()),
        };

        trace!(binding = %self.binding_name, seq = self.seq, "Calling page function");
        self.session
            .evaluate(&function_call_script(
                &self.binding_name,
                self.seq,
                spread.as_deref(),
            ))
            .await
    }

    /// Releases the page function.
    ///
    /// Later calls fail with [`Error::FunctionReleased`]. Releasing twice
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] if the session terminated.
    pub async fn release(&self) -> Result<()> {
        if self.released.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        trace!(binding = %self.binding_name, seq = self.seq, "Releasing page function");
        self.session
            .evaluate(&function_release_script(&self.binding_name, self.seq))
            .await?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_ref_from_marker() {
        let function: FunctionRef =
            serde_json::from_str(r#"{"bindingName":"js2go","seq":2}"#).expect("marker");
        assert_eq!(
            function,
            FunctionRef {
                binding_name: "js2go".to_string(),
                seq: 2
            }
        );
    }

    #[test]
    fn test_function_ref_rejects_plain_values() {
        assert!(serde_json::from_str::<FunctionRef>("5").is_err());
        assert!(serde_json::from_str::<FunctionRef>(r#"{"seq":2}"#).is_err());
    }

    #[test]
    fn test_handle_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FunctionHandle>();
    }
}
