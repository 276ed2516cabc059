//! Outbound writer
//!
//! The writer task is the only owner of the socket's write half. Auth and
//! heartbeat frames reach it through a bounded channel, so frames written by
//! different tasks are never interleaved on the wire.

use bytes::Bytes;
use futures_util::{Sink, SinkExt};
use std::fmt::Display;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::{SessionError, SessionResult};
use crate::protocol::Frame;

/// One encoded frame queued for the socket
#[derive(Debug)]
pub struct WriterCommand {
    pub frame: Bytes,
    /// Notified once the frame has been written (or failed to be)
    pub ack: oneshot::Sender<SessionResult<()>>,
}

impl WriterCommand {
    fn complete(self, result: SessionResult<()>) {
        let _ = self.ack.send(result);
    }
}

/// Cloneable handle for queueing outbound frames
#[derive(Debug, Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<WriterCommand>,
}

impl WriterHandle {
    /// Create a handle and the receiving end of its queue
    pub(crate) fn channel(buffer: usize) -> (Self, mpsc::Receiver<WriterCommand>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { tx }, rx)
    }

    /// Queue a frame and wait until the writer has flushed it to the socket
    pub async fn send_confirmed(&self, frame: &Frame) -> SessionResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.enqueue(WriterCommand {
            frame: frame.to_bytes(),
            ack: ack_tx,
        })
        .await?;

        ack_rx.await.map_err(|_| SessionError::WriterClosed)?
    }

    async fn enqueue(&self, command: WriterCommand) -> SessionResult<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| SessionError::WriterClosed)
    }
}

/// Spawn the writer task over a socket write half
///
/// The task exits when `cancel` fires, when every handle is dropped, or on
/// the first write error. It closes the sink on the way out, which sends a
/// WebSocket close frame.
pub fn spawn_writer<S>(
    sink: S,
    buffer: usize,
    cancel: CancellationToken,
    session_id: String,
) -> (WriterHandle, JoinHandle<()>)
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display,
{
    let (handle, rx) = WriterHandle::channel(buffer);
    let task = tokio::spawn(write_loop(sink, rx, cancel, session_id));
    (handle, task)
}

async fn write_loop<S>(
    mut sink: S,
    mut rx: mpsc::Receiver<WriterCommand>,
    cancel: CancellationToken,
    session_id: String,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    loop {
        let command = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            command = rx.recv() => match command {
                Some(command) => command,
                None => break,
            },
        };

        let len = command.frame.len();
        match sink.send(Message::Binary(command.frame.to_vec())).await {
            Ok(()) => {
                tracing::trace!(session_id = %session_id, len, "Frame written");
                command.complete(Ok(()));
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to write frame to WebSocket"
                );
                command.complete(Err(SessionError::transport(e)));
                break;
            }
        }
    }

    // Anything still queued never reaches the socket
    rx.close();
    while let Ok(command) = rx.try_recv() {
        command.complete(Err(SessionError::WriterClosed));
    }

    if let Err(e) = sink.close().await {
        tracing::debug!(session_id = %session_id, error = %e, "WebSocket close failed");
    }
    tracing::debug!(session_id = %session_id, "Writer task ended");
}
