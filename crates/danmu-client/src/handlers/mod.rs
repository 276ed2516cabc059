//! Frame handlers
//!
//! Interprets decoded frames by op code and turns them into live events for
//! the session's sink.

mod commands;
mod error;
mod registry;

pub use commands::{DanmakuHandler, GiftHandler, UnknownCommandHandler};
pub use error::{HandlerError, HandlerResult};
pub use registry::{CommandEnvelope, CommandHandler, CommandRegistry, SUPPRESSED_COMMANDS};

use bytes::Bytes;
use danmu_core::{EventSink, LiveEvent};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::heartbeat::HeartbeatHandle;
use crate::protocol::{Frame, OpCode};

/// Decode a popularity payload (exactly 4 bytes, big-endian)
pub fn decode_popularity(payload: &[u8]) -> HandlerResult<u32> {
    <[u8; 4]>::try_from(payload)
        .map(u32::from_be_bytes)
        .map_err(|_| {
            HandlerError::malformed(format!(
                "popularity payload is {} bytes, expected 4",
                payload.len()
            ))
        })
}

/// Parse one command payload, route it and emit the result
pub fn handle_command(
    registry: &CommandRegistry,
    sink: &dyn EventSink,
    payload: &[u8],
) -> HandlerResult<()> {
    let body: Value = serde_json::from_slice(payload)?;
    let cmd = body
        .get("cmd")
        .and_then(Value::as_str)
        .ok_or_else(|| HandlerError::malformed("missing string field `cmd`"))?;

    let command = CommandEnvelope {
        cmd,
        body: &body,
        raw: payload,
    };
    if let Some(event) = registry.handle(&command)? {
        sink.emit(event);
    }
    Ok(())
}

/// Dispatch decoded frames for one session
///
/// Command frames run on spawned tasks, at most `concurrency` at a time;
/// [`EventDispatcher::dispatch`] waits for a free slot when the ceiling is
/// reached. Everything else is handled inline.
pub struct EventDispatcher {
    registry: Arc<CommandRegistry>,
    sink: Arc<dyn EventSink>,
    heartbeat: HeartbeatHandle,
    permits: Arc<Semaphore>,
    tasks: JoinSet<()>,
    session_id: String,
}

impl EventDispatcher {
    /// Create a dispatcher
    pub fn new(
        registry: Arc<CommandRegistry>,
        sink: Arc<dyn EventSink>,
        heartbeat: HeartbeatHandle,
        concurrency: usize,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            sink,
            heartbeat,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            tasks: JoinSet::new(),
            session_id: session_id.into(),
        }
    }

    /// Handle one decoded frame
    pub async fn dispatch(&mut self, frame: Frame) {
        self.reap();

        match frame.opcode() {
            Some(OpCode::Popularity) => match decode_popularity(frame.payload()) {
                Ok(count) => self.sink.emit(LiveEvent::Popularity { count }),
                Err(e) => {
                    tracing::warn!(
                        session_id = %self.session_id,
                        error = %e,
                        "Skipping popularity frame"
                    );
                }
            },
            Some(OpCode::Command) => self.spawn_command(frame.payload).await,
            Some(OpCode::HeartbeatRecv) => {
                tracing::trace!(session_id = %self.session_id, "Heartbeat echo received");
                if !self.heartbeat.trigger() {
                    tracing::debug!(session_id = %self.session_id, "Heartbeat scheduler already stopped");
                }
            }
            Some(op) => {
                tracing::info!(
                    session_id = %self.session_id,
                    op = %op,
                    "Ignoring client op code sent by server"
                );
            }
            None => {
                tracing::warn!(
                    session_id = %self.session_id,
                    op = frame.operation,
                    len = frame.payload.len(),
                    "Ignoring unknown op code"
                );
            }
        }
    }

    /// Wait for every spawned command task to finish
    pub async fn drain(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            self.log_join(result);
        }
    }

    async fn spawn_command(&mut self, payload: Bytes) {
        let Ok(permit) = self.permits.clone().acquire_owned().await else {
            return;
        };

        let registry = self.registry.clone();
        let sink = self.sink.clone();
        let session_id = self.session_id.clone();

        self.tasks.spawn(async move {
            let _permit = permit;
            if let Err(e) = handle_command(&registry, sink.as_ref(), &payload) {
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    code = e.code(),
                    "Skipping command frame"
                );
            }
        });
    }

    fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            self.log_join(result);
        }
    }

    fn log_join(&self, result: Result<(), tokio::task::JoinError>) {
        if let Err(e) = result {
            tracing::error!(session_id = %self.session_id, error = %e, "Command task failed");
        }
    }
}
