use crate::engine::{EngineCommand, EngineHandle};
use crate::error::SignalingError;
use crate::negotiation::{RetryPolicy, TokioDelay, with_retry};
use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use beacon_core::{ClientSignal, ServerSignal};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// WebSocket client for the room signaling server.
///
/// Inbound [`ServerSignal`]s are forwarded to the engine as commands. When the
/// socket drops the engine is told so, and the client reconnects with a fixed
/// delay for as long as the engine is alive.
pub struct WsSignaling {
    url: String,
    reconnect_delay: Duration,
    writer: Mutex<Option<mpsc::UnboundedSender<Message>>>,
}

impl WsSignaling {
    pub fn new(url: impl Into<String>) -> Arc<Self> {
        Self::with_reconnect_delay(url, DEFAULT_RECONNECT_DELAY)
    }

    pub fn with_reconnect_delay(url: impl Into<String>, reconnect_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            url: url.into(),
            reconnect_delay,
            writer: Mutex::new(None),
        })
    }

    /// Connect once and keep the connection alive in the background.
    ///
    /// The first connection failure is returned to the caller; later drops are
    /// retried without bound.
    pub async fn start(self: &Arc<Self>, engine: EngineHandle) -> Result<(), SignalingError> {
        let stream = self.open().await?;
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run(stream, engine).await });
        Ok(())
    }

    pub async fn is_connected(&self) -> bool {
        self.writer.lock().await.is_some()
    }

    async fn open(&self) -> Result<WsStream, SignalingError> {
        let (stream, _response) = connect_async(self.url.as_str()).await?;
        info!("Connected to signaling server {}", self.url);
        Ok(stream)
    }

    async fn run(self: Arc<Self>, mut stream: WsStream, engine: EngineHandle) {
        loop {
            self.serve(stream, &engine).await;
            *self.writer.lock().await = None;

            warn!("Signaling connection to {} lost", self.url);
            if engine.send(EngineCommand::SignalingLost).await.is_err() {
                break;
            }

            let policy = RetryPolicy::unbounded(self.reconnect_delay);
            let (this, handle) = (&*self, &engine);
            let reconnected = with_retry(&policy, &TokioDelay, |_attempt| async move {
                if handle.is_closed() {
                    return Ok(None);
                }
                this.open().await.map(Some)
            })
            .await;

            stream = match reconnected {
                Ok(Some(stream)) => stream,
                Ok(None) => break,
                Err(e) => {
                    error!("Giving up on signaling server {}: {}", self.url, e);
                    break;
                }
            };

            if engine.send(EngineCommand::SignalingRestored).await.is_err() {
                break;
            }
        }

        info!("Signaling client for {} stopped", self.url);
    }

    /// Pump one connection until either direction closes.
    async fn serve(&self, stream: WsStream, engine: &EngineHandle) {
        let (mut sink, mut source) = stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

        *self.writer.lock().await = Some(tx);

        let mut send_task = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if sink.send(msg).await.is_err() {
                    break;
                }
            }
        });

        let mut recv_task = tokio::spawn({
            let engine = engine.clone();

            async move {
                while let Some(Ok(msg)) = source.next().await {
                    match msg {
                        Message::Text(text) => match serde_json::from_str::<ServerSignal>(&text) {
                            Ok(signal) => {
                                if let Err(e) = engine.dispatch(signal).await {
                                    error!("Engine died: {}", e);
                                    break;
                                }
                            }
                            Err(e) => warn!("Invalid signal from server: {:?}", e),
                        },
                        Message::Close(_) => break,
                        _ => {}
                    }
                }
            }
        });

        tokio::select! {
            _ = (&mut send_task) => recv_task.abort(),
            _ = (&mut recv_task) => send_task.abort(),
        };
    }
}

#[async_trait]
impl SignalingOutput for WsSignaling {
    async fn send(&self, signal: ClientSignal) -> Result<(), SignalingError> {
        let text = serde_json::to_string(&signal)?;
        let writer = self.writer.lock().await;
        let Some(tx) = writer.as_ref() else {
            return Err(SignalingError::Disconnected);
        };
        tx.send(Message::Text(text))
            .map_err(|_| SignalingError::Disconnected)
    }
}
