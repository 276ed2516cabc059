//! Broadcast session
//!
//! A [`Session`] is one authenticated connection to a room. Building it dials
//! the server and sends the auth frame; [`Session::run`] then drives the read
//! loop until the server goes away, a frame fails to decode, or the session
//! is closed through its [`SessionCloser`].

use danmu_common::{AppError, SessionConfig};
use danmu_core::{EventSink, RoomId};
use futures_util::stream::SplitStream;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::{spawn_writer, SessionError, SessionResult, SessionState, SessionStatus, WriterHandle};
use crate::handlers::{CommandRegistry, EventDispatcher};
use crate::heartbeat::HeartbeatScheduler;
use crate::protocol::{decode_all, AuthPayload, Frame, OpCode};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Builder for [`Session`]
pub struct SessionBuilder {
    room_id: RoomId,
    url: Option<String>,
    config: SessionConfig,
    sink: Option<Arc<dyn EventSink>>,
    registry: Option<Arc<CommandRegistry>>,
    status: SessionStatus,
}

impl SessionBuilder {
    fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            url: None,
            config: SessionConfig::default(),
            sink: None,
            registry: None,
            status: SessionStatus::new(),
        }
    }

    /// Broadcast server WebSocket URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Heartbeat, dispatch and handshake settings
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Where decoded events go
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Command routing table (defaults to [`CommandRegistry::with_defaults`])
    pub fn registry(mut self, registry: Arc<CommandRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Share a status handle to observe the lifecycle from outside
    pub fn status(mut self, status: SessionStatus) -> Self {
        self.status = status;
        self
    }

    /// Dial the server and authenticate
    ///
    /// Returns once the auth frame has been written; the server sends no
    /// acknowledgement, so the session is `Live` from that point.
    pub async fn connect(self) -> SessionResult<Session> {
        let url = self.url.ok_or(SessionError::MissingOption("url"))?;
        let sink = self.sink.ok_or(SessionError::MissingOption("sink"))?;
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(CommandRegistry::with_defaults()));
        let status = self.status;
        let config = self.config;
        let room_id = self.room_id;
        let id = Uuid::new_v4().to_string();

        status.transition(SessionState::Connecting)?;
        tracing::info!(session_id = %id, room_id = %room_id, url = %url, "Connecting to broadcast server");

        let (ws, _response) = match connect_async(url.as_str()).await {
            Ok(connected) => connected,
            Err(e) => {
                status.fail();
                tracing::warn!(session_id = %id, error = %e, "Failed to connect");
                return Err(SessionError::transport(e));
            }
        };
        status.transition(SessionState::Authenticating)?;

        let (ws_sink, stream) = ws.split();
        let cancel = CancellationToken::new();
        let (writer, writer_task) =
            spawn_writer(ws_sink, config.outbound_buffer, cancel.clone(), id.clone());

        if let Err(e) = authenticate(&writer, room_id, &config).await {
            status.fail();
            cancel.cancel();
            tracing::warn!(session_id = %id, error = %e, "Failed to send auth frame");
            return Err(e);
        }
        status.transition(SessionState::Live)?;
        tracing::info!(session_id = %id, room_id = %room_id, "Session live");

        Ok(Session {
            id,
            room_id,
            config,
            status,
            stream,
            writer,
            writer_task,
            cancel,
            sink,
            registry,
        })
    }
}

async fn authenticate(writer: &WriterHandle, room_id: RoomId, config: &SessionConfig) -> SessionResult<()> {
    let payload = AuthPayload::new(room_id, config.platform.clone(), config.client_version.clone()).to_bytes()?;
    let frame = Frame::new(OpCode::Auth, payload)?;
    writer.send_confirmed(&frame).await
}

/// Requests a graceful shutdown of a running session
#[derive(Debug, Clone)]
pub struct SessionCloser {
    cancel: CancellationToken,
}

impl SessionCloser {
    /// Stop the session; `run` returns `Ok(())` once it has wound down
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Check if close has been requested
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// An authenticated broadcast connection
pub struct Session {
    id: String,
    room_id: RoomId,
    config: SessionConfig,
    status: SessionStatus,
    stream: SplitStream<WsStream>,
    writer: WriterHandle,
    writer_task: JoinHandle<()>,
    cancel: CancellationToken,
    sink: Arc<dyn EventSink>,
    registry: Arc<CommandRegistry>,
}

impl Session {
    /// Start building a session for `room_id`
    pub fn builder(room_id: RoomId) -> SessionBuilder {
        SessionBuilder::new(room_id)
    }

    /// Session id used in log fields
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.status.get()
    }

    /// Shared lifecycle handle
    pub fn status(&self) -> SessionStatus {
        self.status.clone()
    }

    /// Handle for closing the session from another task
    pub fn closer(&self) -> SessionCloser {
        SessionCloser {
            cancel: self.cancel.clone(),
        }
    }

    /// Run the session until it closes or fails
    ///
    /// Starts the heartbeat scheduler, then reads and dispatches frames in
    /// arrival order. Any transport or framing error ends the session in
    /// `Failed` and is returned; a close request ends it in `Closed` after
    /// in-flight command handling has finished.
    pub async fn run(self) -> SessionResult<()> {
        let Self {
            id,
            room_id,
            config,
            status,
            mut stream,
            writer,
            writer_task,
            cancel,
            sink,
            registry,
        } = self;

        let (scheduler, heartbeat) = HeartbeatScheduler::new(
            config.heartbeat_interval(),
            writer,
            cancel.clone(),
            id.clone(),
        );
        let heartbeat_task = scheduler.spawn();
        let mut dispatcher =
            EventDispatcher::new(registry, sink, heartbeat, config.dispatch_concurrency, id.clone());

        let result = read_loop(&id, &mut stream, &mut dispatcher, &cancel).await;

        // Stops the scheduler and the writer; the writer sends the close frame
        cancel.cancel();
        for (name, task) in [("heartbeat", heartbeat_task), ("writer", writer_task)] {
            if let Err(e) = task.await {
                tracing::error!(session_id = %id, task = name, error = %e, "Session task failed");
            }
        }

        match result {
            Ok(()) => {
                dispatcher.drain().await;
                status.transition(SessionState::Closed)?;
                tracing::info!(session_id = %id, room_id = %room_id, "Session closed");
                Ok(())
            }
            Err(e) => {
                status.fail();
                tracing::error!(session_id = %id, room_id = %room_id, error = %e, "Session failed");
                Err(e)
            }
        }
    }
}

async fn read_loop(
    session_id: &str,
    stream: &mut SplitStream<WsStream>,
    dispatcher: &mut EventDispatcher,
    cancel: &CancellationToken,
) -> SessionResult<()> {
    loop {
        let message = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            message = stream.next() => message,
        };

        let data = match message {
            Some(Ok(Message::Binary(data))) => data,
            Some(Ok(Message::Text(text))) => text.into_bytes(),
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
            Some(Ok(Message::Close(frame))) => {
                let reason = frame.map(|f| f.reason.into_owned()).unwrap_or_default();
                return Err(SessionError::transport(format!(
                    "server closed the connection: {reason}"
                )));
            }
            Some(Err(e)) => return Err(SessionError::transport(e)),
            None => return Err(SessionError::transport("connection ended")),
        };

        let frames = decode_all(data)?;
        tracing::trace!(session_id = %session_id, frames = frames.len(), "Message received");

        for frame in frames {
            dispatcher.dispatch(frame).await;
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Frame(e) => AppError::protocol(e),
            SessionError::MissingOption(_) | SessionError::InvalidTransition { .. } => {
                AppError::internal(err)
            }
            other => AppError::transport(other),
        }
    }
}
