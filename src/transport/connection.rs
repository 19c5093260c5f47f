//! WebSocket connection and event loop.
//!
//! This module handles the DevTools WebSocket, including request/response
//! correlation and event routing.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that handles:
//!
//! - Incoming messages from the browser (responses, events)
//! - Outgoing commands from the Rust API
//! - Request/response correlation by integer id
//! - Event handler callbacks

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, from_str, to_string};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{RequestId, RequestIdGenerator, SessionId};
use crate::protocol::{Command, Event, Request, Response};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for command execution.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum pending requests before rejecting new ones.
const MAX_PENDING_REQUESTS: usize = 100;

/// Upper bound for a single message; scaled element screenshots are large.
const MAX_MESSAGE_SIZE: usize = 256 << 20;

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Map of request IDs to response channels.
type CorrelationMap = FxHashMap<RequestId, oneshot::Sender<Result<Response>>>;

/// Event handler callback type.
///
/// Called for each event received from the browser.
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

/// WebSocket connection to a browser's DevTools endpoint.
///
/// Handles request/response correlation and event routing.
/// The connection spawns an internal event loop task.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync` and cheap to clone; clones share the
/// same socket and id counter.
#[derive(Clone)]
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Correlation map (shared with event loop).
    correlation: Arc<Mutex<CorrelationMap>>,
    /// Event handler (shared with event loop).
    event_handler: Arc<Mutex<Option<EventHandler>>>,
    /// Per-connection request id allocator.
    ids: Arc<RequestIdGenerator>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("pending", &self.correlation.lock().len())
            .field("closed", &self.command_tx.is_closed())
            .finish()
    }
}

impl Connection {
    /// Connects to a DevTools WebSocket URL.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if the handshake fails
    pub async fn connect(ws_url: &str) -> Result<Self> {
        info!(url = ws_url, "Connecting to DevTools WebSocket");

        let config = WebSocketConfig::default()
            .max_message_size(Some(MAX_MESSAGE_SIZE))
            .max_frame_size(Some(MAX_MESSAGE_SIZE));

        let (ws_stream, _) =
            tokio_tungstenite::connect_async_with_config(ws_url, Some(config), false)
                .await
                .map_err(|e| Error::connection(format!("{ws_url}: {e}")))?;

        debug!(url = ws_url, "DevTools WebSocket connected");
        Ok(Self::new(ws_stream))
    }

    /// Creates a new connection from a WebSocket stream.
    ///
    /// Spawns the event loop task internally.
    pub(crate) fn new(ws_stream: WsStream) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let correlation = Arc::new(Mutex::new(CorrelationMap::default()));
        let event_handler: Arc<Mutex<Option<EventHandler>>> = Arc::new(Mutex::new(None));

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&correlation),
            Arc::clone(&event_handler),
        ));

        Self {
            command_tx,
            correlation,
            event_handler,
            ids: Arc::new(RequestIdGenerator::default()),
        }
    }

    /// Sets the event handler callback.
    pub fn set_event_handler(&self, handler: EventHandler) {
        *self.event_handler.lock() = Some(handler);
    }

    /// Clears the event handler.
    pub fn clear_event_handler(&self) {
        *self.event_handler.lock() = None;
    }

    /// Sends a command and returns its result value (default 30s timeout).
    ///
    /// `session_id` routes the command to an attached target; `None` sends
    /// it to the browser target.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if connection is closed
    /// - [`Error::RequestTimeout`] if response not received within timeout
    /// - [`Error::Cdp`] if the browser reports an error
    pub async fn execute(&self, session_id: Option<&SessionId>, command: Command) -> Result<Value> {
        self.execute_with_timeout(session_id, command, DEFAULT_COMMAND_TIMEOUT)
            .await
    }

    /// Sends a command with a custom timeout and returns its result value.
    pub async fn execute_with_timeout(
        &self,
        session_id: Option<&SessionId>,
        command: Command,
        request_timeout: Duration,
    ) -> Result<Value> {
        let request = Request::new(self.ids.next_id(), session_id.cloned(), command);
        let method = request.method();
        let response = self.send_with_timeout(request, request_timeout).await?;
        response.into_result(method)
    }

    /// Sends a request and waits for response with custom timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if connection is closed
    /// - [`Error::RequestTimeout`] if response not received within timeout
    /// - [`Error::Protocol`] if too many pending requests
    pub async fn send_with_timeout(
        &self,
        request: Request,
        request_timeout: Duration,
    ) -> Result<Response> {
        let request_id = request.id;

        {
            let correlation = self.correlation.lock();
            if correlation.len() >= MAX_PENDING_REQUESTS {
                warn!(
                    pending = correlation.len(),
                    max = MAX_PENDING_REQUESTS,
                    "Too many pending requests"
                );
                return Err(Error::protocol(format!(
                    "Too many pending requests: {}/{}",
                    correlation.len(),
                    MAX_PENDING_REQUESTS
                )));
            }
        }

        let (response_tx, response_rx) = oneshot::channel();

        self.command_tx
            .send(ConnectionCommand::Send {
                request,
                response_tx,
            })
            .map_err(|_| Error::ConnectionClosed)?;

        match timeout(request_timeout, response_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
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

    /// Returns the number of pending requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlation.lock().len()
    }

    /// Closes the WebSocket.
    ///
    /// Not called on drop: clones share the socket.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        ws_stream: WsStream,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        correlation: Arc<Mutex<CorrelationMap>>,
        event_handler: Arc<Mutex<Option<EventHandler>>>,
    ) {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming_message(&text, &correlation, &event_handler);
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by browser");
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

                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { request, response_tx }) => {
                            Self::handle_send_command(
                                request,
                                response_tx,
                                &mut ws_write,
                                &correlation,
                            ).await;
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

        Self::fail_pending_requests(&correlation);

        debug!("Event loop terminated");
    }

    /// Handles an incoming text message from the browser.
    fn handle_incoming_message(
        text: &str,
        correlation: &Arc<Mutex<CorrelationMap>>,
        event_handler: &Arc<Mutex<Option<EventHandler>>>,
    ) {
        if let Ok(response) = from_str::<Response>(text) {
            let tx = correlation.lock().remove(&response.id);

            if let Some(tx) = tx {
                let _ = tx.send(Ok(response));
            } else {
                warn!(id = %response.id, "Response for unknown request");
            }
            return;
        }

        if let Ok(event) = from_str::<Event>(text) {
            trace!(method = %event.method, "Event received");
            let handler = event_handler.lock();
            if let Some(ref handler) = *handler {
                handler(event);
            }
            return;
        }

        warn!(len = text.len(), "Failed to parse incoming message");
    }

    /// Handles a send command from the Rust API.
    async fn handle_send_command(
        request: Request,
        response_tx: oneshot::Sender<Result<Response>>,
        ws_write: &mut SplitSink<WsStream, Message>,
        correlation: &Arc<Mutex<CorrelationMap>>,
    ) {
        let request_id = request.id;

        let json = match to_string(&request) {
            Ok(j) => j,
            Err(e) => {
                let _ = response_tx.send(Err(Error::Json(e)));
                return;
            }
        };

        // Store correlation before sending
        correlation.lock().insert(request_id, response_tx);

        if let Err(e) = ws_write.send(Message::Text(json.into())).await
            && let Some(tx) = correlation.lock().remove(&request_id)
        {
            let _ = tx.send(Err(Error::connection(e.to_string())));
        }

        trace!(%request_id, method = request.method(), "Request sent");
    }

    /// Fails all pending requests with ConnectionClosed error.
    fn fail_pending_requests(correlation: &Arc<Mutex<CorrelationMap>>) {
        let pending: Vec<_> = correlation.lock().drain().collect();
        let count = pending.len();

        for (_, tx) in pending {
            let _ = tx.send(Err(Error::ConnectionClosed));
        }

        if count > 0 {
            debug!(count, "Failed pending requests on shutdown");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tokio::net::TcpListener;

    use crate::protocol::{PageCommand, TargetCommand};

    /// Spawns a single-connection server that answers every command.
    ///
    /// `Page.enable` fails, `Target.activateTarget` emits an event before
    /// its reply, everything else echoes its method back.
    async fn spawn_fake_browser() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(stream)
                .await
                .expect("handshake");

            while let Some(Ok(Message::Text(text))) = ws.next().await {
                let request: Value = serde_json::from_str(&text).expect("request json");
                if request["method"] == "Target.activateTarget" {
                    let event = json!({
                        "method": "Target.targetCrashed",
                        "params": {"targetId": "T1", "status": "crashed"}
                    });
                    ws.send(Message::Text(event.to_string().into()))
                        .await
                        .expect("send event");
                }
                let reply = if request["method"] == "Page.enable" {
                    json!({"id": request["id"], "error": {"code": -32601, "message": "not allowed"}})
                } else {
                    json!({"id": request["id"], "result": {"echo": request["method"]}})
                };
                ws.send(Message::Text(reply.to_string().into()))
                    .await
                    .expect("send reply");
            }
        });

        format!("ws://{addr}")
    }

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_COMMAND_TIMEOUT.as_secs(), 30);
        assert_eq!(MAX_PENDING_REQUESTS, 100);
    }

    #[tokio::test]
    async fn test_execute_correlates_response() {
        let url = spawn_fake_browser().await;
        let connection = Connection::connect(&url).await.expect("connect");

        let result = connection
            .execute(None, Command::Target(TargetCommand::GetTargets))
            .await
            .expect("execute");

        assert_eq!(result["echo"], "Target.getTargets");
        assert_eq!(connection.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_execute_maps_cdp_error() {
        let url = spawn_fake_browser().await;
        let connection = Connection::connect(&url).await.expect("connect");

        let err = connection
            .execute(Some(&SessionId::new("S1")), Command::Page(PageCommand::Enable))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cdp { code: -32601, ref method, .. } if method == "Page.enable"));
    }

    #[tokio::test]
    async fn test_events_reach_handler() {
        let url = spawn_fake_browser().await;
        let connection = Connection::connect(&url).await.expect("connect");

        let (tx, mut rx) = mpsc::unbounded_channel();
        connection.set_event_handler(Box::new(move |event| {
            let _ = tx.send(event.method);
        }));

        connection
            .execute(
                None,
                Command::Target(TargetCommand::ActivateTarget {
                    target_id: crate::identifiers::TargetId::new("T1"),
                }),
            )
            .await
            .expect("execute");

        // The event was written before the reply, so it is already queued.
        let method = rx.try_recv().expect("event delivered");
        assert_eq!(method, "Target.targetCrashed");
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let err = Connection::connect(&format!("ws://{addr}")).await.unwrap_err();
        assert!(err.is_connection_error());
    }

    #[tokio::test]
    async fn test_debug_reports_pending() {
        let url = spawn_fake_browser().await;
        let connection = Connection::connect(&url).await.expect("connect");

        let debug = format!("{connection:?}");
        assert!(debug.starts_with("Connection"));
        assert!(debug.contains("pending: 0"));
    }
}
