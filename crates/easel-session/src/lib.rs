//! Easel Session - collaborative editing session core
//!
//! The concurrent heart of the coordinator:
//! - Wire messages exchanged with clients
//! - Connection registry (asset → live viewers)
//! - Edit-lock state machine (asset → holder)
//! - Ordered event pipeline (bounded queue, single consumer)
//! - Broadcast dispatcher (fan-out with partial-failure isolation)
//!
//! Transport-agnostic: viewers are outbound `String`-frame channels, so the
//! server crate can pump them into whatever socket type it owns.

#![warn(unreachable_pub)]

pub mod broadcast;
pub mod lock;
pub mod message;
pub mod pipeline;
pub mod processor;
pub mod registry;

// Re-exports for convenience
pub use broadcast::BroadcastDispatcher;
pub use lock::EditLocks;
pub use message::{FrameKind, InboundFrame, Notification, NotificationKind, PrincipalView};
pub use pipeline::{EditEvent, EditEventKind, EventPipeline};
pub use processor::SessionProcessor;
pub use registry::{ConnectionId, ConnectionRegistry, ViewerHandle};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
