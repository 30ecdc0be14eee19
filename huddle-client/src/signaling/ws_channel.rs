use crate::error::SignalingError;
use crate::signaling::hub_protocol::{self, HubMessage};
use crate::signaling::{SignalDispatcher, SignalHandler, SignalingChannel};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use huddle_core::{OutboundSignal, SignalKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at, timeout};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// The hub drops clients that stay silent for 30 seconds.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

struct Connection {
    tx: mpsc::UnboundedSender<Message>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

/// [`SignalingChannel`] to a SignalR meeting hub over a WebSocket, speaking
/// the JSON hub protocol.
///
/// Connects straight to the hub endpoint without the HTTP negotiate step.
#[derive(Clone)]
pub struct WsSignalingChannel {
    url: String,
    dispatcher: SignalDispatcher,
    connection: Arc<Mutex<Option<Connection>>>,
}

impl WsSignalingChannel {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            dispatcher: SignalDispatcher::new(),
            connection: Arc::new(Mutex::new(None)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn is_connected(&self) -> bool {
        self.connection
            .lock()
            .await
            .as_ref()
            .is_some_and(|conn| !conn.reader.is_finished())
    }

    fn unavailable(&self, reason: impl std::fmt::Display) -> SignalingError {
        SignalingError::Unavailable(format!("{}: {}", self.url, reason))
    }
}

/// Dispatches every record of a frame. Returns `false` once the hub closed
/// the connection.
fn dispatch_frame(dispatcher: &SignalDispatcher, url: &str, frame: &str) -> bool {
    for record in hub_protocol::records(frame) {
        match hub_protocol::decode_record(record) {
            Ok(HubMessage::Invocation(signal)) => {
                if dispatcher.dispatch(&signal) == 0 {
                    debug!("No handler for {}", signal.kind());
                }
            }
            Ok(HubMessage::Ping) => {}
            Ok(HubMessage::Close { error }) => {
                match error {
                    Some(error) => warn!("Hub {} closed the connection: {}", url, error),
                    None => info!("Hub {} closed the connection", url),
                }
                return false;
            }
            Ok(HubMessage::Ignored(kind)) => debug!("Skipping hub record of type {}", kind),
            Err(e) => warn!("Invalid record from {}: {}", url, e),
        }
    }
    true
}

#[async_trait]
impl SignalingChannel for WsSignalingChannel {
    async fn connect(&self) -> Result<(), SignalingError> {
        let mut guard = self.connection.lock().await;
        if guard.as_ref().is_some_and(|conn| !conn.reader.is_finished()) {
            return Ok(());
        }

        let (ws_stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| self.unavailable(e))?;
        let (mut sender, mut receiver) = ws_stream.split();

        sender
            .send(Message::Text(hub_protocol::handshake_request().into()))
            .await
            .map_err(|e| self.unavailable(e))?;

        let response = match timeout(HANDSHAKE_TIMEOUT, receiver.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => text,
            Ok(Some(Ok(other))) => {
                return Err(self.unavailable(format!("unexpected handshake frame {other:?}")));
            }
            Ok(Some(Err(e))) => return Err(self.unavailable(e)),
            Ok(None) => return Err(self.unavailable("closed during handshake")),
            Err(_) => return Err(self.unavailable("handshake timed out")),
        };
        let rest = hub_protocol::accept_handshake(response.as_str())
            .map_err(|e| self.unavailable(e))?;
        info!("Connected to signaling hub {}", self.url);

        if !dispatch_frame(&self.dispatcher, &self.url, rest) {
            return Err(self.unavailable("closed right after the handshake"));
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

        let writer = tokio::spawn(async move {
            let mut keepalive = interval_at(Instant::now() + KEEPALIVE_INTERVAL, KEEPALIVE_INTERVAL);
            loop {
                let msg = tokio::select! {
                    msg = rx.recv() => match msg {
                        Some(msg) => msg,
                        None => break,
                    },
                    _ = keepalive.tick() => Message::Text(hub_protocol::ping().into()),
                };

                let closing = matches!(msg, Message::Close(_));
                if sender.send(msg).await.is_err() || closing {
                    break;
                }
            }
        });

        let dispatcher = self.dispatcher.clone();
        let url = self.url.clone();
        let reader = tokio::spawn(async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => {
                        if !dispatch_frame(&dispatcher, &url, text.as_str()) {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            info!("Signaling connection to {} closed", url);
        });

        *guard = Some(Connection { tx, writer, reader });
        Ok(())
    }

    async fn disconnect(&self) {
        let Some(conn) = self.connection.lock().await.take() else {
            return;
        };

        // The writer exits after flushing the close frame.
        let _ = conn.tx.send(Message::Close(None));
        drop(conn.tx);
        conn.reader.abort();
        if conn.writer.await.is_err() {
            debug!("Signaling writer for {} ended abnormally", self.url);
        }
        info!("Disconnected from signaling hub {}", self.url);
    }

    async fn try_send(&self, signal: OutboundSignal) -> Result<(), SignalingError> {
        let guard = self.connection.lock().await;
        let conn = guard.as_ref().ok_or(SignalingError::NotConnected)?;

        let record = hub_protocol::encode_invocation(&signal);
        conn.tx
            .send(Message::Text(record.into()))
            .map_err(|_| SignalingError::SendFailed {
                event: signal.name(),
                reason: "connection closed".to_owned(),
            })
    }

    fn on(&self, kind: SignalKind, handler: SignalHandler) {
        self.dispatcher.on(kind, handler);
    }
}
