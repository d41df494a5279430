//! WebSocket connection and event loop.
//!
//! This module handles the WebSocket connection to the engine's debugging
//! endpoint, including request/response correlation and event routing.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that handles:
//!
//! - Incoming messages from the engine (replies, events)
//! - Outgoing commands from the Rust API
//! - Request/response correlation by numeric ID
//! - Event handler callbacks
//!
//! When the loop stops, for whatever reason, every pending request fails
//! with [`Error::SessionClosed`] and [`Connection::closed`] resolves.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, from_str, to_string};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::{RequestId, RequestIdGenerator, TargetSessionId};
use crate::protocol::{Command, Event, Incoming, Request, Response};

// ============================================================================
// Constants
// ============================================================================

/// Longest frame excerpt written to logs.
const LOG_EXCERPT_LEN: usize = 200;

// ============================================================================
// Types
// ============================================================================

/// Map of request IDs to response channels.
type CorrelationMap = FxHashMap<RequestId, oneshot::Sender<Result<Response>>>;

/// Event handler callback type.
///
/// Called on the event loop task for each event received from the engine.
/// Handlers must not block; long work belongs on a spawned task.
pub type EventHandler = Box<dyn Fn(Event) + Send + Sync>;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Send a request and wait for response.
    Send {
        request: Request,
        response_tx: oneshot::Sender<Result<Response>>,
    },
    /// Remove a timed-out correlation entry.
    RemoveCorrelation(RequestId),
    /// Shutdown the connection.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket connection to a DevTools endpoint.
///
/// Handles request/response correlation and event routing.
/// The connection spawns an internal event loop task.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync` and can be shared across tasks.
/// Any number of tasks may call [`Connection::call`] concurrently.
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Correlation map (shared with event loop).
    correlation: Arc<Mutex<CorrelationMap>>,
    /// Event handler (shared with event loop).
    event_handler: Arc<Mutex<Option<EventHandler>>>,
    /// Request ID source for this connection only.
    ids: Arc<RequestIdGenerator>,
    /// Flips to `true` once the event loop has stopped.
    closed: watch::Receiver<bool>,
    /// Optional per-request timeout.
    request_timeout: Option<Duration>,
}

impl Clone for Connection {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            correlation: Arc::clone(&self.correlation),
            event_handler: Arc::clone(&self.event_handler),
            ids: Arc::clone(&self.ids),
            closed: self.closed.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

impl Connection {
    /// Connects to a DevTools WebSocket endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `ws_url` is not a `ws://` or `wss://` URL
    /// - [`Error::Connection`] if the handshake fails
    pub async fn connect(ws_url: &str) -> Result<Self> {
        let url = Url::parse(ws_url)
            .map_err(|e| Error::config(format!("Invalid endpoint URL {ws_url}: {e}")))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "Endpoint must be a WebSocket URL, got {ws_url}"
            )));
        }

        debug!(url = %url, "Connecting to DevTools endpoint");

        let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| Error::connection(format!("{url}: {e}")))?;

        debug!(url = %url, "WebSocket connection established");

        Ok(Self::new(ws_stream))
    }

    /// Creates a new connection from a WebSocket stream.
    ///
    /// Spawns the event loop task internally.
    pub fn new<S>(ws_stream: WebSocketStream<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (closed_tx, closed_rx) = watch::channel(false);
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));
        let event_handler: Arc<Mutex<Option<EventHandler>>> = Arc::new(Mutex::new(None));

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&correlation),
            Arc::clone(&event_handler),
            closed_tx,
        ));

        Self {
            command_tx,
            correlation,
            event_handler,
            ids: Arc::new(RequestIdGenerator::new()),
            closed: closed_rx,
            request_timeout: None,
        }
    }

    /// Returns a handle that fails requests not answered within `timeout`.
    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Option<Duration>) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Sets the event handler callback.
    pub fn set_event_handler(&self, handler: EventHandler) {
        let mut guard = self.event_handler.lock();
        *guard = Some(handler);
    }

    /// Clears the event handler.
    pub fn clear_event_handler(&self) {
        let mut guard = self.event_handler.lock();
        *guard = None;
    }

    /// Sends a command and returns its result payload.
    ///
    /// `session_id` scopes the command to an attached target; `None`
    /// addresses the endpoint itself.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionClosed`] if the connection is or becomes closed
    /// - [`Error::Engine`] if the engine answers with an error object
    /// - [`Error::RequestTimeout`] if a request timeout is configured and elapses
    pub async fn call(
        &self,
        command: Command,
        session_id: Option<TargetSessionId>,
    ) -> Result<Value> {
        let request = Request::new(self.ids.next_id(), session_id, command);
        trace!(id = %request.id, method = request.command.method(), "Calling");
        self.send(request).await?.into_result()
    }

    /// Sends a request and waits for the raw response.
    ///
    /// Uses the configured request timeout, if any.
    pub async fn send(&self, request: Request) -> Result<Response> {
        match self.request_timeout {
            Some(request_timeout) => self.send_with_timeout(request, request_timeout).await,
            None => {
                let response_rx = self.enqueue(request)?;
                response_rx.await.map_err(|_| Error::SessionClosed)?
            }
        }
    }

    /// Sends a request and waits for response with custom timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionClosed`] if connection is closed
    /// - [`Error::RequestTimeout`] if response not received within timeout
    pub async fn send_with_timeout(
        &self,
        request: Request,
        request_timeout: Duration,
    ) -> Result<Response> {
        let request_id = request.id;
        let response_rx = self.enqueue(request)?;

        match timeout(request_timeout, response_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::SessionClosed),
            Err(_) => {
                // Timeout - clean up correlation entry
                let _ = self
                    .command_tx
                    .send(ConnectionCommand::RemoveCorrelation(request_id));

                Err(Error::request_timeout(
                    request_id,
                    request_timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Hands a request to the event loop.
    fn enqueue(&self, request: Request) -> Result<oneshot::Receiver<Result<Response>>> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(ConnectionCommand::Send {
                request,
                response_tx,
            })
            .map_err(|_| Error::SessionClosed)?;
        Ok(response_rx)
    }

    /// Returns the number of pending requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.lock().len()
    }

    /// Returns `true` once the event loop has stopped.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Waits until the event loop has stopped.
    pub async fn closed(&self) {
        let mut closed = self.closed.clone();
        // The sender is dropped only after publishing `true`.
        let _ = closed.wait_for(|closed| *closed).await;
    }

    /// Shuts down the connection.
    ///
    /// Idempotent; pending requests fail with [`Error::SessionClosed`].
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop<S>(
        ws_stream: WebSocketStream<S>,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        correlation: Arc<Mutex<CorrelationMap>>,
        event_handler: Arc<Mutex<Option<EventHandler>>>,
        closed_tx: watch::Sender<bool>,
    ) where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming messages from the engine
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming_message(&text, &correlation, &event_handler);
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from Rust API
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { request, response_tx }) => {
                            if let Err(e) = Self::handle_send_command(
                                request,
                                response_tx,
                                &mut ws_write,
                                &correlation,
                            ).await {
                                error!(error = %e, "WebSocket write failed");
                                break;
                            }
                        }

                        Some(ConnectionCommand::RemoveCorrelation(request_id)) => {
                            correlation.lock().remove(&request_id);
                            debug!(%request_id, "Removed timed-out correlation");
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            break;
                        }
                    }
                }
            }
        }

        // Refuse new work, then fail everything in flight
        command_rx.close();
        while let Ok(command) = command_rx.try_recv() {
            if let ConnectionCommand::Send { response_tx, .. } = command {
                let _ = response_tx.send(Err(Error::SessionClosed));
            }
        }
        Self::fail_pending_requests(&correlation);
        event_handler.lock().take();
        closed_tx.send_replace(true);

        debug!("Event loop terminated");
    }

    /// Handles an incoming text message from the engine.
    fn handle_incoming_message(
        text: &str,
        correlation: &Arc<Mutex<CorrelationMap>>,
        event_handler: &Arc<Mutex<Option<EventHandler>>>,
    ) {
        match from_str::<Incoming>(text) {
            Ok(Incoming::Reply(response)) => {
                let tx = correlation.lock().remove(&response.id);

                match tx {
                    Some(tx) => {
                        trace!(id = %response.id, error = response.is_error(), "Reply received");
                        let _ = tx.send(Ok(response));
                    }
                    None => warn!(id = %response.id, "Reply for unknown request"),
                }
            }

            Ok(Incoming::Event(event)) => {
                trace!(method = %event.method, "Event received");
                let handler = event_handler.lock();
                if let Some(ref handler) = *handler {
                    handler(event);
                }
            }

            Err(e) => {
                warn!(error = %e, text = %excerpt(text), "Failed to parse incoming message");
                Self::fail_malformed_reply(text, &e, correlation);
            }
        }
    }

    /// Fails the caller of a reply that carries an `id` but no valid body.
    fn fail_malformed_reply(
        text: &str,
        parse_error: &serde_json::Error,
        correlation: &Arc<Mutex<CorrelationMap>>,
    ) {
        let Some(id) = from_str::<Value>(text)
            .ok()
            .and_then(|frame| frame.get("id").and_then(Value::as_u64))
        else {
            return;
        };

        let request_id = RequestId::new(id);
        if let Some(tx) = correlation.lock().remove(&request_id) {
            let _ = tx.send(Err(Error::protocol(format!(
                "malformed reply to request {request_id}: {parse_error}"
            ))));
        }
    }

    /// Handles a send command from the Rust API.
    ///
    /// Returns an error only when the socket itself failed.
    async fn handle_send_command<W>(
        request: Request,
        response_tx: oneshot::Sender<Result<Response>>,
        ws_write: &mut W,
        correlation: &Arc<Mutex<CorrelationMap>>,
    ) -> Result<()>
    where
        W: futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
    {
        let request_id = request.id;

        // Serialize request
        let json = match to_string(&request) {
            Ok(j) => j,
            Err(e) => {
                let _ = response_tx.send(Err(Error::Json(e)));
                return Ok(());
            }
        };

        // Store correlation before sending
        correlation.lock().insert(request_id, response_tx);

        // Send over WebSocket
        if let Err(e) = ws_write.send(Message::Text(json.into())).await {
            if let Some(tx) = correlation.lock().remove(&request_id) {
                let _ = tx.send(Err(Error::connection(e.to_string())));
            }
            return Err(Error::WebSocket(e));
        }

        trace!(%request_id, "Request sent");
        Ok(())
    }

    /// Fails all pending requests with SessionClosed error.
    fn fail_pending_requests(correlation: &Arc<Mutex<CorrelationMap>>) {
        let pending: Vec<_> = correlation.lock().drain().collect();
        let count = pending.len();

        for (_, tx) in pending {
            let _ = tx.send(Err(Error::SessionClosed));
        }

        if count > 0 {
            debug!(count, "Failed pending requests on shutdown");
        }
    }
}

/// Truncates a frame for logging.
fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(LOG_EXCERPT_LEN) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

// ============================================================================
// Tests
// ============================================================================
