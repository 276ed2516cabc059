//! Test helpers for integration tests
//!
//! Provides an in-process broadcast server that records the frames a client
//! sends and replays scripted frames back, plus a sink that forwards events
//! to the test body.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use danmu_client::connection::{Session, SessionError, SessionStatus};
use danmu_client::protocol::{decode_all, encode, Frame, OpCode};
use danmu_common::SessionConfig;
use danmu_core::{EventSink, LiveEvent, RoomId};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Default wait for anything the client is expected to do
pub const WAIT: Duration = Duration::from_secs(5);

/// Scripted server behavior
#[derive(Debug)]
enum ServerAction {
    Send(Message),
    Close,
    Disconnect,
}

/// Single-connection broadcast server
pub struct MockBroadcastServer {
    addr: SocketAddr,
    received: mpsc::UnboundedReceiver<Frame>,
    actions: mpsc::UnboundedSender<ServerAction>,
    _handle: JoinHandle<()>,
}

impl MockBroadcastServer {
    /// Bind to an ephemeral port and wait for one client
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (received_tx, received) = mpsc::unbounded_channel();
        let (actions, actions_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            if let Err(e) = serve_one(listener, received_tx, actions_rx).await {
                eprintln!("mock broadcast server stopped: {e:#}");
            }
        });

        Ok(Self {
            addr,
            received,
            actions,
            _handle: handle,
        })
    }

    /// WebSocket URL of the server
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Send one frame to the client
    pub fn send_frame(&self, op: OpCode, payload: &[u8]) -> Result<()> {
        let bytes = encode(op, payload)?;
        self.send_raw(bytes.to_vec())
    }

    /// Send arbitrary bytes as one binary message
    pub fn send_raw(&self, bytes: Vec<u8>) -> Result<()> {
        self.act(ServerAction::Send(Message::Binary(bytes)))
    }

    /// Send a WebSocket close frame and stop
    pub fn close(&self) -> Result<()> {
        self.act(ServerAction::Close)
    }

    /// Drop the TCP connection without a close frame
    pub fn disconnect(&self) -> Result<()> {
        self.act(ServerAction::Disconnect)
    }

    /// Next frame received from the client, `None` once the client is gone
    pub async fn next_frame(&mut self) -> Result<Option<Frame>> {
        tokio::time::timeout(WAIT, self.received.recv())
            .await
            .context("timed out waiting for a client frame")
    }

    /// Assert that no frame arrives within `window`
    pub async fn expect_silence(&mut self, window: Duration) -> Result<()> {
        match tokio::time::timeout(window, self.received.recv()).await {
            Err(_) | Ok(None) => Ok(()),
            Ok(Some(frame)) => anyhow::bail!("unexpected frame: {:?}", frame.opcode()),
        }
    }

    fn act(&self, action: ServerAction) -> Result<()> {
        self.actions
            .send(action)
            .map_err(|_| anyhow::anyhow!("mock server already stopped"))
    }
}

async fn serve_one(
    listener: TcpListener,
    received: mpsc::UnboundedSender<Frame>,
    mut actions: mpsc::UnboundedReceiver<ServerAction>,
) -> Result<()> {
    let (stream, _) = listener.accept().await?;
    let ws = accept_async(stream).await?;
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            message = stream.next() => match message {
                Some(Ok(Message::Binary(data))) => {
                    for frame in decode_all(data)? {
                        // Receiver may be gone when a test no longer cares
                        let _ = received.send(frame);
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            },
            action = actions.recv() => match action {
                Some(ServerAction::Send(message)) => sink.send(message).await?,
                Some(ServerAction::Close) => {
                    sink.send(Message::Close(None)).await?;
                    break;
                }
                Some(ServerAction::Disconnect) | None => break,
            },
        }
    }
    Ok(())
}

/// Sink that forwards every event to a channel
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<LiveEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver its events arrive on
    pub fn pair() -> (Arc<Self>, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), EventReceiver { rx })
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: LiveEvent) {
        let _ = self.tx.send(event);
    }
}

/// Test side of a [`ChannelSink`]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<LiveEvent>,
}

impl EventReceiver {
    /// Wait for the next event
    pub async fn next(&mut self) -> Result<LiveEvent> {
        tokio::time::timeout(WAIT, self.rx.recv())
            .await
            .context("timed out waiting for an event")?
            .context("sink dropped")
    }

    /// Events already delivered, without waiting
    pub fn drain(&mut self) -> Vec<LiveEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Session settings for tests: periodic heartbeats effectively disabled
pub fn test_session_config() -> SessionConfig {
    SessionConfig {
        heartbeat_interval_secs: 3600,
        ..SessionConfig::default()
    }
}

/// A connected session running on its own task
pub struct RunningSession {
    pub status: SessionStatus,
    pub closer: danmu_client::SessionCloser,
    pub task: JoinHandle<Result<(), SessionError>>,
}

impl RunningSession {
    /// Connect to `server` and start the read loop
    pub async fn start(
        server: &MockBroadcastServer,
        room_id: RoomId,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        Self::start_with_config(server, room_id, sink, test_session_config()).await
    }

    pub async fn start_with_config(
        server: &MockBroadcastServer,
        room_id: RoomId,
        sink: Arc<dyn EventSink>,
        config: SessionConfig,
    ) -> Result<Self> {
        let status = SessionStatus::new();
        let session = Session::builder(room_id)
            .url(server.url())
            .config(config)
            .sink(sink)
            .status(status.clone())
            .connect()
            .await?;

        let closer = session.closer();
        let task = tokio::spawn(session.run());
        Ok(Self {
            status,
            closer,
            task,
        })
    }

    /// Wait for `run` to return
    pub async fn finish(self) -> Result<Result<(), SessionError>> {
        Ok(tokio::time::timeout(WAIT, self.task)
            .await
            .context("session did not stop")??)
    }
}
