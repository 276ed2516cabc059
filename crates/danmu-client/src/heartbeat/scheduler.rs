//! Heartbeat scheduler task

use bytes::Bytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::connection::{SessionError, WriterHandle};
use crate::protocol::{Frame, OpCode, HEARTBEAT_PAYLOAD};

/// Shortest period the scheduler will tick at
const MIN_PERIOD: Duration = Duration::from_secs(1);

/// Why a heartbeat was sent
#[derive(Debug, Clone, Copy)]
enum Reason {
    Interval,
    Echo,
}

impl Reason {
    fn as_str(self) -> &'static str {
        match self {
            Self::Interval => "interval",
            Self::Echo => "echo",
        }
    }
}

/// Handle for requesting out-of-band heartbeats
#[derive(Debug, Clone)]
pub struct HeartbeatHandle {
    trigger_tx: mpsc::UnboundedSender<()>,
    sent: Arc<AtomicU64>,
}

impl HeartbeatHandle {
    /// Request one immediate heartbeat
    ///
    /// Requests queue up: each call yields exactly one extra frame. Returns
    /// false once the scheduler has stopped.
    pub fn trigger(&self) -> bool {
        self.trigger_tx.send(()).is_ok()
    }

    /// Number of heartbeats written so far
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// A handle not attached to any scheduler; the receiver sees each trigger
    #[cfg(test)]
    pub(crate) fn detached() -> (Self, mpsc::UnboundedReceiver<()>) {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let handle = Self {
            trigger_tx,
            sent: Arc::new(AtomicU64::new(0)),
        };
        (handle, trigger_rx)
    }
}

/// Periodic heartbeat sender
///
/// Sends a `HeartbeatSend` frame every `period` (first one a full period
/// after start) and one more for every [`HeartbeatHandle::trigger`] call.
/// All frames go through the session's writer.
pub struct HeartbeatScheduler {
    period: Duration,
    writer: WriterHandle,
    cancel: CancellationToken,
    trigger_rx: mpsc::UnboundedReceiver<()>,
    sent: Arc<AtomicU64>,
    session_id: String,
}

impl HeartbeatScheduler {
    /// Create a scheduler and the handle used to trigger it
    ///
    /// `period` is raised to one second when shorter.
    pub fn new(
        period: Duration,
        writer: WriterHandle,
        cancel: CancellationToken,
        session_id: impl Into<String>,
    ) -> (Self, HeartbeatHandle) {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let sent = Arc::new(AtomicU64::new(0));

        let scheduler = Self {
            period: period.max(MIN_PERIOD),
            writer,
            cancel,
            trigger_rx,
            sent: sent.clone(),
            session_id: session_id.into(),
        };
        (scheduler, HeartbeatHandle { trigger_tx, sent })
    }

    /// Run the scheduler on its own task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until cancelled or the writer goes away
    pub async fn run(mut self) {
        let frame = match Frame::new(OpCode::HeartbeatSend, Bytes::from_static(HEARTBEAT_PAYLOAD)) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(session_id = %self.session_id, error = %e, "Cannot build heartbeat frame");
                return;
            }
        };

        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::debug!(
            session_id = %self.session_id,
            period_secs = self.period.as_secs(),
            "Heartbeat scheduler started"
        );

        loop {
            let reason = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                Some(()) = self.trigger_rx.recv() => Reason::Echo,
                _ = ticker.tick() => Reason::Interval,
            };

            if !self.beat(&frame, reason).await {
                break;
            }
        }

        tracing::debug!(
            session_id = %self.session_id,
            sent = self.sent.load(Ordering::Relaxed),
            "Heartbeat scheduler stopped"
        );
    }

    /// Send one heartbeat; returns false when the scheduler should stop
    async fn beat(&self, frame: &Frame, reason: Reason) -> bool {
        match self.writer.send_confirmed(frame).await {
            Ok(()) => {
                let sent = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::debug!(
                    session_id = %self.session_id,
                    reason = reason.as_str(),
                    sent,
                    "Heartbeat sent"
                );
                true
            }
            Err(SessionError::WriterClosed) => {
                tracing::debug!(session_id = %self.session_id, "Writer closed, stopping heartbeats");
                false
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %self.session_id,
                    reason = reason.as_str(),
                    error = %e,
                    "Failed to send heartbeat"
                );
                true
            }
        }
    }
}
