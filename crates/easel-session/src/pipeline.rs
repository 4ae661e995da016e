//! Ordered event pipeline
//!
//! All edit-related events funnel through one bounded queue consumed by a
//! single task, so the edit-lock state machine only ever sees one event at
//! a time, in arrival order. Producers never wait: on a full queue the
//! event is dropped and the originating connection is told nothing. This is
//! a deliberately lossy backpressure policy: edit events are frequent and
//! stale ones are superseded by later ones, so shedding beats unbounded
//! buffering or blocking the network reader.

use crate::message::{FrameKind, InboundFrame};
use crate::processor::SessionProcessor;
use crate::registry::ConnectionId;
use easel_access::{AssetId, Principal};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// What an inbound event asks the state machine to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEventKind {
    /// Request the exclusive edit lock
    EnterEdit,
    /// Forward an edit action (holder only)
    EditAction {
        /// Opaque action payload, forwarded verbatim
        action: String,
    },
    /// Release the exclusive edit lock
    ExitEdit,
    /// The connection closed; synthesizes the holder's exit
    Disconnected,
}

/// One inbound edit-related event, consumed exactly once in FIFO order
#[derive(Debug, Clone)]
pub struct EditEvent {
    /// Asset the event applies to
    pub asset_id: AssetId,
    /// Originating connection
    pub connection_id: ConnectionId,
    /// Principal behind the connection
    pub principal: Arc<Principal>,
    /// Requested transition
    pub kind: EditEventKind,
}

impl EditEvent {
    /// Build an event from a parsed client frame
    ///
    /// Returns `None` for an `EDIT_ACTION` frame without a payload; there
    /// is nothing to forward, so the frame is dropped.
    #[must_use]
    pub fn from_frame(
        asset_id: AssetId,
        connection_id: ConnectionId,
        principal: Arc<Principal>,
        frame: InboundFrame,
    ) -> Option<Self> {
        let kind = match frame.kind {
            FrameKind::EnterEdit => EditEventKind::EnterEdit,
            FrameKind::EditAction => EditEventKind::EditAction {
                action: frame.edit_action?,
            },
            FrameKind::ExitEdit => EditEventKind::ExitEdit,
        };
        Some(Self {
            asset_id,
            connection_id,
            principal,
            kind,
        })
    }

    /// Build the synthetic disconnection event for a closing connection
    #[must_use]
    pub fn disconnected(
        asset_id: AssetId,
        connection_id: ConnectionId,
        principal: Arc<Principal>,
    ) -> Self {
        Self {
            asset_id,
            connection_id,
            principal,
            kind: EditEventKind::Disconnected,
        }
    }
}

/// Multi-producer handle onto the single-consumer event queue
#[derive(Debug, Clone)]
pub struct EventPipeline {
    sender: mpsc::Sender<EditEvent>,
}

impl EventPipeline {
    /// Default queue capacity
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Create the queue and spawn its sole consumer task
    ///
    /// The consumer is the only mutator of edit-lock state; it runs until
    /// every pipeline handle is dropped.
    #[must_use]
    pub fn start(capacity: usize, processor: SessionProcessor) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let consumer = tokio::spawn(consume(receiver, processor));
        (Self { sender }, consumer)
    }

    /// Enqueue an event without blocking
    ///
    /// Returns `false` when the event was shed (queue saturated or
    /// consumer gone). Callers must not surface this to the client.
    pub fn publish(&self, event: EditEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                // Best-effort shedding, not an error condition.
                warn!(
                    asset = %event.asset_id,
                    connection = %event.connection_id,
                    "event queue saturated, dropping event"
                );
                false
            }
            Err(TrySendError::Closed(event)) => {
                debug!(asset = %event.asset_id, "event pipeline stopped, dropping event");
                false
            }
        }
    }
}

async fn consume(mut receiver: mpsc::Receiver<EditEvent>, processor: SessionProcessor) {
    while let Some(event) = receiver.recv().await {
        processor.apply(event);
    }
    debug!("event pipeline consumer stopped");
}
