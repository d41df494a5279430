//! Script evaluation in the page's main context.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{Command, RuntimeCommand};
use crate::value::JsValue;

use super::Session;

// ============================================================================
// Wire Types
// ============================================================================

/// `Runtime.evaluate` reply.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateReply {
    #[serde(default)]
    result: RemoteObject,
    exception_details: Option<ExceptionDetails>,
}

/// Mirror of a `Runtime.RemoteObject` returned by value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteObject {
    #[serde(rename = "type", default)]
    kind: String,
    subtype: Option<String>,
    value: Option<Value>,
    unserializable_value: Option<String>,
    description: Option<String>,
}

/// Mirror of `Runtime.ExceptionDetails`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExceptionDetails {
    #[serde(default)]
    text: String,
    exception: Option<RemoteObject>,
}

// ============================================================================
// Session - Evaluation
// ============================================================================

impl Session {
    /// Evaluates `expression` in the page and returns its JSON text.
    ///
    /// Promises are awaited. `undefined` yields an empty value.
    ///
    /// A thrown exception or a rejected promise is **not** an error: the
    /// thrown value is returned as if it were the result. Only a parse
    /// failure is reported as [`Error::Syntax`].
    ///
    /// # Errors
    ///
    /// - [`Error::Syntax`] if the expression does not parse
    /// - [`Error::SessionClosed`] if the session terminates first
    pub async fn evaluate(&self, expression: &str) -> Result<JsValue> {
        let reply = self
            .send_command(Command::Runtime(RuntimeCommand::evaluate(expression)))
            .await?;
        let reply: EvaluateReply = serde_json::from_value(reply)?;
        interpret(reply)
    }

    /// Evaluates `expression` and decodes the value into `T`.
    ///
    /// # Errors
    ///
    /// As [`evaluate`](Self::evaluate), plus [`Error::Json`] when the value
    /// does not match `T` and [`Error::InvalidArgument`] for `undefined`.
    pub async fn evaluate_as<T: DeserializeOwned>(&self, expression: &str) -> Result<T> {
        self.evaluate(expression).await?.decode()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Turns an evaluate reply into a value or a syntax error.
fn interpret(reply: EvaluateReply) -> Result<JsValue> {
    let Some(details) = reply.exception_details else {
        return Ok(to_json_text(&reply.result));
    };

    let Some(exception) = details.exception else {
        return Err(Error::syntax(details.text));
    };
    if is_compile_failure(&exception) {
        let message = exception
            .description
            .filter(|d| !d.is_empty())
            .unwrap_or(details.text);
        return Err(Error::syntax(message));
    }

    debug!(text = %details.text, "Evaluation threw, returning thrown value");
    Ok(to_json_text(&exception))
}

/// A compile failure reports an error object with no by-value form.
///
/// Anything thrown at run time, a `SyntaxError` from `JSON.parse` included,
/// arrives with a `value`.
fn is_compile_failure(exception: &RemoteObject) -> bool {
    exception.subtype.as_deref() == Some("error")
        && exception.value.is_none()
        && exception.unserializable_value.is_none()
}

/// Canonical JSON text of a by-value remote object, as `JSON.stringify`.
fn to_json_text(object: &RemoteObject) -> JsValue {
    if let Some(value) = &object.value {
        return JsValue::from_json(value);
    }

    if let Some(unserializable) = &object.unserializable_value {
        return match unserializable.as_str() {
            "-0" => JsValue::from_raw("0"),
            _ => JsValue::from_raw("null"),
        };
    }

    // `"value": null` and objects without a JSON form land here.
    match object.kind.as_str() {
        "object" if object.subtype.as_deref() == Some("null") => JsValue::from_raw("null"),
        "object" => JsValue::from_raw("{}"),
        _ => JsValue::undefined(),
    }
}

// ============================================================================
// Tests
// ============================================================================
