//! Host functions callable from page script.
//!
//! A bound name appears on `window` as an `async` function. Each page call
//! reaches the host as a `Runtime.bindingCalled` event, runs the handler on
//! its own task and settles the page promise exactly once.
//!
//! # Example
//!
//! ```no_run
//! # async fn example(session: devtools_bridge::Session) -> devtools_bridge::Result<()> {
//! session
//!     .bind("add", |call| async move {
//!         call.expect_len(2)?;
//!         Ok(call.arg::<i64>(0)? + call.arg::<i64>(1)?)
//!     })
//!     .await?;
//!
//! // The page receives the JSON text of the result.
//! assert_eq!(session.evaluate("window.add(2, 3)").await?, r#""5""#);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{Command, PageCommand, RuntimeCommand};

use super::Session;
use super::function::{FunctionHandle, FunctionRef};
use super::script::{binding_script, completion_script, unbind_script};

// ============================================================================
// Types
// ============================================================================

/// Type-erased handler stored per binding.
type Handler = Arc<dyn Fn(BindingCall) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// Registry entry for one bound name.
pub(crate) struct BoundFunction {
    handler: Handler,
    /// Identifier of the new-document script, once installed.
    script_id: Option<String>,
}

/// Payload the page proxy passes to the raw binding.
#[derive(Debug, Deserialize)]
struct Invocation {
    seq: u64,
    #[serde(default)]
    args: Vec<Box<RawValue>>,
}

// ============================================================================
// BindingCall
// ============================================================================

/// One page-side invocation of a bound function.
///
/// Arguments are kept as raw JSON text and decoded on request.
#[derive(Debug)]
pub struct BindingCall {
    name: String,
    seq: u64,
    args: Vec<Box<RawValue>>,
    session: Session,
}

impl BindingCall {
    /// Returns the binding name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the page-side sequence number of this call.
    #[inline]
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns the number of arguments.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Returns `true` if the page passed no arguments.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Returns the JSON text of argument `index`.
    #[must_use]
    pub fn raw_arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(|raw| raw.get())
    }

    /// Fails unless exactly `expected` arguments were passed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] on a count mismatch.
    pub fn expect_len(&self, expected: usize) -> Result<()> {
        if self.args.len() != expected {
            return Err(Error::invalid_argument(format!(
                "{expected} arguments expected, got {}",
                self.args.len()
            )));
        }
        Ok(())
    }

    /// Decodes argument `index` into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the argument is missing or
    /// does not match `T`.
    pub fn arg<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        let raw = self
            .raw_arg(index)
            .ok_or_else(|| Error::invalid_argument(format!("missing argument {index}")))?;
        serde_json::from_str(raw)
            .map_err(|e| Error::invalid_argument(format!("argument {index}: {e}")))
    }

    /// Decodes argument `index` as a page function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the argument is not a function.
    pub fn function(&self, index: usize) -> Result<FunctionHandle> {
        let function: FunctionRef = self.arg(index).map_err(|_| {
            Error::invalid_argument(format!("argument {index} is not a function"))
        })?;
        Ok(FunctionHandle::new(self.session.clone(), function))
    }

    /// Returns the session the call came from.
    #[inline]
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }
}

// ============================================================================
// Session - Bindings
// ============================================================================

impl Session {
    /// Exposes `handler` to the page as `window[name]`.
    ///
    /// The binding survives navigation. From page script it is an `async`
    /// function whose promise resolves to the JSON text of the handler's
    /// result, or rejects with the error message. Handlers reject a call
    /// with their own text through [`Error::handler`].
    ///
    /// The session owns its handlers, so a handler must not capture a
    /// [`Session`] clone: that keeps the session alive after every other
    /// handle is dropped. Use [`BindingCall::session`] instead.
    ///
    /// # Errors
    ///
    /// - [`Error::BindingExists`] if `name` is already bound
    /// - [`Error::SessionClosed`] if the session terminates first
    pub async fn bind<F, Fut, T>(&self, name: &str, handler: F) -> Result<()>
    where
        F: Fn(BindingCall) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Serialize + 'static,
    {
        let handler: Handler = Arc::new(move |call| {
            let pending = handler(call);
            async move {
                let result = pending.await?;
                serde_json::to_value(result).map_err(Error::from)
            }
            .boxed()
        });

        {
            let mut bindings = self.inner.bindings.lock();
            if bindings.contains_key(name) {
                return Err(Error::binding_exists(name));
            }
            bindings.insert(
                name.to_string(),
                BoundFunction {
                    handler,
                    script_id: None,
                },
            );
        }

        if let Err(e) = self.install_binding(name).await {
            self.inner.bindings.lock().remove(name);
            return Err(e);
        }

        debug!(uuid = %self.inner.uuid, name, "Function bound");
        Ok(())
    }

    /// Removes a binding from the page and from future documents.
    ///
    /// Page calls still in flight are not answered.
    ///
    /// # Errors
    ///
    /// - [`Error::BindingNotFound`] if `name` is not bound
    /// - [`Error::SessionClosed`] if the session terminates first
    pub async fn unbind(&self, name: &str) -> Result<()> {
        let bound = self
            .inner
            .bindings
            .lock()
            .remove(name)
            .ok_or_else(|| Error::binding_not_found(name))?;

        self.send_command(Command::Runtime(RuntimeCommand::RemoveBinding {
            name: name.to_string(),
        }))
        .await?;

        if let Some(identifier) = bound.script_id {
            self.send_command(Command::Page(
                PageCommand::RemoveScriptToEvaluateOnNewDocument { identifier },
            ))
            .await?;
        }

        self.evaluate(&unbind_script(name)).await?;
        debug!(uuid = %self.inner.uuid, name, "Function unbound");
        Ok(())
    }

    /// Returns the currently bound names, sorted.
    #[must_use]
    pub fn bindings(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.bindings.lock().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Registers the raw binding and installs the proxy script.
    async fn install_binding(&self, name: &str) -> Result<()> {
        self.send_command(Command::Runtime(RuntimeCommand::AddBinding {
            name: name.to_string(),
        }))
        .await?;

        let script = binding_script(name);
        let added = self
            .send_command(Command::Page(
                PageCommand::AddScriptToEvaluateOnNewDocument {
                    source: script.clone(),
                },
            ))
            .await?;

        if let Some(identifier) = added.get("identifier").and_then(Value::as_str)
            && let Some(bound) = self.inner.bindings.lock().get_mut(name)
        {
            bound.script_id = Some(identifier.to_string());
        }

        self.evaluate(&script).await?;
        Ok(())
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Runs the handler for a `Runtime.bindingCalled` event on its own task.
pub(crate) fn dispatch(session: Session, name: String, payload: String) {
    let Some(handler) = session
        .inner
        .bindings
        .lock()
        .get(&name)
        .map(|bound| Arc::clone(&bound.handler))
    else {
        warn!(name = %name, "Binding called but not registered");
        return;
    };

    let invocation: Invocation = match serde_json::from_str(&payload) {
        Ok(invocation) => invocation,
        Err(e) => {
            warn!(name = %name, error = %e, "Malformed binding payload");
            return;
        }
    };

    let seq = invocation.seq;
    trace!(name = %name, seq, args = invocation.args.len(), "Binding called");

    tokio::spawn(async move {
        let call = BindingCall {
            name: name.clone(),
            seq,
            args: invocation.args,
            session: session.clone(),
        };

        let outcome = match AssertUnwindSafe(async move { handler(call).await })
            .catch_unwind()
            .await
        {
            Ok(Ok(value)) => serde_json::to_string(&value).map_err(|e| e.to_string()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(Error::handler(format!("{name} handler panicked")).to_string()),
        };

        if let Err(e) = &outcome {
            debug!(name = %name, seq, error = %e, "Binding handler failed");
        }

        if let Err(e) = session
            .evaluate(&completion_script(&name, seq, &outcome))
            .await
        {
            debug!(name = %name, seq, error = %e, "Failed to deliver binding result");
        }
    });
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_keeps_raw_args() {
        let invocation: Invocation = serde_json::from_str(
            r#"{"name":"add","seq":3,"args":[2, {"bindingName":"add","seq":1}]}"#,
        )
        .expect("valid payload");
        assert_eq!(invocation.seq, 3);
        assert_eq!(invocation.args.len(), 2);
        assert_eq!(invocation.args[0].get(), "2");
        assert_eq!(invocation.args[1].get(), r#"{"bindingName":"add","seq":1}"#);
    }

    #[test]
    fn test_invocation_without_args() {
        let invocation: Invocation =
            serde_json::from_str(r#"{"name":"ping","seq":1}"#).expect("valid payload");
        assert!(invocation.args.is_empty());
    }
}
