//! Scripted in-process DevTools endpoint for integration tests.
//!
//! The mock accepts one WebSocket client, records every request, and
//! answers through a responder closure. Tests push events with
//! [`MockEngine::emit`] and observe traffic with
//! [`MockEngine::wait_for_request`].

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;

/// Attached session ID handed out by the mock.
pub const SESSION_ID: &str = "S1";

/// How long helpers wait before failing a test.
pub const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Reply
// ============================================================================

/// How the mock answers one request.
pub enum Reply {
    /// `{"id", "result"}`.
    Result(Value),
    /// `{"id", "error": {code, message}}`.
    Error(i64, String),
    /// No reply at all.
    Hold,
}

impl Reply {
    /// `Runtime.evaluate` result carrying a by-value JSON value.
    pub fn value(value: Value) -> Self {
        Self::Result(json!({ "result": remote_object(value) }))
    }

    /// `Runtime.evaluate` result for `undefined`.
    pub fn undefined() -> Self {
        Self::Result(json!({ "result": { "type": "undefined" } }))
    }

    /// `Runtime.evaluate` result for a parse failure.
    pub fn syntax_error(description: &str) -> Self {
        let exception = json!({
            "type": "object",
            "subtype": "error",
            "className": "SyntaxError",
            "description": description,
        });
        Self::Result(json!({
            "result": exception,
            "exceptionDetails": {
                "exceptionId": 1,
                "text": "Uncaught",
                "lineNumber": 0,
                "columnNumber": 0,
                "exception": exception,
            }
        }))
    }

    /// `Runtime.evaluate` result for a thrown value.
    pub fn thrown(value: Value) -> Self {
        Self::Result(json!({
            "result": remote_object(value.clone()),
            "exceptionDetails": {
                "exceptionId": 1,
                "text": "Uncaught",
                "lineNumber": 0,
                "columnNumber": 0,
                "exception": remote_object(value),
            }
        }))
    }

    /// `Runtime.evaluate` result for an error object thrown at run time.
    pub fn thrown_error(class_name: &str, description: &str) -> Self {
        let exception = json!({
            "type": "object",
            "subtype": "error",
            "className": class_name,
            "description": description,
            "value": {},
        });
        Self::Result(json!({
            "result": exception,
            "exceptionDetails": {
                "exceptionId": 1,
                "text": "Uncaught",
                "lineNumber": 0,
                "columnNumber": 0,
                "exception": exception,
            }
        }))
    }
}

/// By-value `Runtime.RemoteObject` for `value`.
fn remote_object(value: Value) -> Value {
    match value {
        Value::Null => json!({ "type": "object", "subtype": "null", "value": null }),
        Value::Bool(_) => json!({ "type": "boolean", "value": value }),
        Value::Number(_) => json!({ "type": "number", "value": value }),
        Value::String(_) => json!({ "type": "string", "value": value }),
        Value::Array(_) => json!({ "type": "object", "subtype": "array", "value": value }),
        Value::Object(_) => json!({ "type": "object", "value": value }),
    }
}

/// Replies for the attach and setup commands a session sends.
pub fn default_reply(method: &str, _params: &Value) -> Reply {
    match method {
        "Target.getTargets" => Reply::Result(json!({
            "targetInfos": [
                { "targetId": "worker-1", "type": "service_worker", "url": "" },
                { "targetId": "page-1", "type": "page", "url": "about:blank" },
            ]
        })),
        "Target.attachToTarget" => Reply::Result(json!({ "sessionId": SESSION_ID })),
        "Target.createTarget" => Reply::Result(json!({ "targetId": "page-new" })),
        "Page.addScriptToEvaluateOnNewDocument" => {
            Reply::Result(json!({ "identifier": "script-1" }))
        }
        "Page.navigate" => Reply::Result(json!({ "frameId": "frame-1", "loaderId": "loader-1" })),
        "Runtime.evaluate" => Reply::undefined(),
        _ => Reply::Result(json!({})),
    }
}

// ============================================================================
// MockEngine
// ============================================================================

type Responder = Arc<dyn Fn(&str, &Value) -> Reply + Send + Sync>;

enum Outgoing {
    Frame(String),
    Close,
}

/// A single-client DevTools endpoint.
pub struct MockEngine {
    addr: std::net::SocketAddr,
    push_tx: mpsc::UnboundedSender<Outgoing>,
    requests: Arc<Mutex<Vec<Value>>>,
    received: watch::Sender<usize>,
    disconnected: watch::Receiver<bool>,
}

impl MockEngine {
    /// Starts an endpoint answering with [`default_reply`].
    pub async fn start() -> Self {
        Self::with_responder(default_reply).await
    }

    /// Starts an endpoint that answers `Runtime.evaluate` with `evaluate`
    /// and everything else with [`default_reply`].
    pub async fn with_evaluator<F>(evaluate: F) -> Self
    where
        F: Fn(&str) -> Reply + Send + Sync + 'static,
    {
        Self::with_responder(move |method, params| {
            if method == "Runtime.evaluate" {
                evaluate(params["expression"].as_str().unwrap_or_default())
            } else {
                default_reply(method, params)
            }
        })
        .await
    }

    /// Starts an endpoint answering every request with `responder`.
    pub async fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&str, &Value) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (push_tx, push_rx) = mpsc::unbounded_channel();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let received = watch::Sender::new(0);
        let (disconnected_tx, disconnected) = watch::channel(false);

        tokio::spawn(serve(
            listener,
            Arc::new(responder),
            Arc::clone(&requests),
            received.clone(),
            push_rx,
            disconnected_tx,
        ));

        Self {
            addr,
            push_tx,
            requests,
            received,
            disconnected,
        }
    }

    /// Browser-level endpoint URL.
    pub fn browser_url(&self) -> String {
        format!("ws://{}/devtools/browser/mock", self.addr)
    }

    /// Page-level endpoint URL.
    pub fn page_url(&self) -> String {
        format!("ws://{}/devtools/page/page-1", self.addr)
    }

    /// Emits an event scoped to the attached session.
    pub fn emit(&self, method: &str, params: Value) {
        self.emit_to(Some(SESSION_ID), method, params);
    }

    /// Emits an event with an explicit (or no) session ID.
    pub fn emit_to(&self, session_id: Option<&str>, method: &str, params: Value) {
        let mut event = json!({ "method": method, "params": params });
        if let Some(session_id) = session_id {
            event["sessionId"] = json!(session_id);
        }
        let _ = self.push_tx.send(Outgoing::Frame(event.to_string()));
    }

    /// Emits `Runtime.bindingCalled` as the page proxy would.
    pub fn call_binding(&self, name: &str, seq: u64, args: Value) {
        let payload = json!({ "name": name, "seq": seq, "args": args }).to_string();
        self.emit(
            "Runtime.bindingCalled",
            json!({ "name": name, "payload": payload, "executionContextId": 1 }),
        );
    }

    /// Closes the WebSocket from the engine side.
    pub fn close(&self) {
        let _ = self.push_tx.send(Outgoing::Close);
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().clone()
    }

    /// Returns the methods received so far, in order.
    pub fn methods(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .filter_map(|r| r["method"].as_str().map(str::to_string))
            .collect()
    }

    /// Returns `Runtime.evaluate` expressions received so far, in order.
    pub fn expressions(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r["method"] == "Runtime.evaluate")
            .filter_map(|r| r["params"]["expression"].as_str().map(str::to_string))
            .collect()
    }

    /// Waits for a request matching `predicate`, panicking after [`WAIT`].
    pub async fn wait_for_request<P>(&self, predicate: P) -> Value
    where
        P: Fn(&Value) -> bool,
    {
        let mut received = self.received.subscribe();
        let found = tokio::time::timeout(WAIT, async {
            loop {
                received.borrow_and_update();
                if let Some(request) = self.requests.lock().iter().find(|r| predicate(r)) {
                    return request.clone();
                }
                if received.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        })
        .await;
        found.expect("expected request did not arrive")
    }

    /// Waits for a `Runtime.evaluate` whose expression starts with `prefix`.
    pub async fn wait_for_expression(&self, prefix: &str) -> String {
        let request = self
            .wait_for_request(|r| {
                r["method"] == "Runtime.evaluate"
                    && r["params"]["expression"]
                        .as_str()
                        .is_some_and(|e| e.starts_with(prefix))
            })
            .await;
        request["params"]["expression"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }

    /// Waits until the client connection is gone, panicking after [`WAIT`].
    pub async fn wait_disconnected(&self) {
        let mut disconnected = self.disconnected.clone();
        tokio::time::timeout(WAIT, disconnected.wait_for(|gone| *gone))
            .await
            .expect("client did not disconnect")
            .expect("mock server stopped");
    }
}

async fn serve(
    listener: TcpListener,
    responder: Responder,
    requests: Arc<Mutex<Vec<Value>>>,
    received: watch::Sender<usize>,
    mut push_rx: mpsc::UnboundedReceiver<Outgoing>,
    disconnected: watch::Sender<bool>,
) {
    let Ok((stream, _)) = listener.accept().await else {
        return;
    };
    let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
        return;
    };

    loop {
        tokio::select! {
            frame = ws.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let Ok(request) = serde_json::from_str::<Value>(&text) else {
                        continue;
                    };
                    requests.lock().push(request.clone());
                    received.send_modify(|count| *count += 1);

                    let method = request["method"].as_str().unwrap_or_default();
                    let params = request.get("params").cloned().unwrap_or(Value::Null);
                    let mut reply = match responder(method, &params) {
                        Reply::Result(result) => json!({ "id": request["id"], "result": result }),
                        Reply::Error(code, message) => json!({
                            "id": request["id"],
                            "error": { "code": code, "message": message },
                        }),
                        Reply::Hold => continue,
                    };
                    if let Some(session_id) = request.get("sessionId") {
                        reply["sessionId"] = session_id.clone();
                    }
                    if ws.send(Message::Text(reply.to_string().into())).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },

            outgoing = push_rx.recv() => match outgoing {
                Some(Outgoing::Frame(text)) => {
                    if ws.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Some(Outgoing::Close) | None => {
                    let _ = ws.close(None).await;
                    break;
                }
            },
        }
    }

    disconnected.send_replace(true);
}

// ============================================================================
// Logging
// ============================================================================

/// Installs a test subscriber honouring `RUST_LOG`; safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
