//! Broadcast dispatcher
//!
//! Fans a notification out to every live viewer of an asset, optionally
//! excluding the originating connection. The notification is serialized
//! once; a dead connection is skipped without aborting delivery to the
//! rest.

use crate::message::Notification;
use crate::registry::{ConnectionId, ConnectionRegistry};
use easel_access::AssetId;
use std::sync::Arc;
use tracing::{debug, error};

/// Fans out notifications over the connection registry
#[derive(Debug, Clone)]
pub struct BroadcastDispatcher {
    registry: Arc<ConnectionRegistry>,
}

impl BroadcastDispatcher {
    /// Create a dispatcher over a registry
    #[inline]
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this dispatcher fans out over
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Send `notification` to every viewer of `asset_id` except `exclude`
    ///
    /// Returns the number of connections the frame was queued for.
    pub fn broadcast(
        &self,
        asset_id: AssetId,
        notification: &Notification,
        exclude: Option<ConnectionId>,
    ) -> usize {
        let viewers = self.registry.viewers_of(asset_id);
        if viewers.is_empty() {
            return 0;
        }

        let frame = match serde_json::to_string(notification) {
            Ok(frame) => frame,
            Err(err) => {
                error!(%asset_id, %err, "failed to serialize notification");
                return 0;
            }
        };

        let mut delivered = 0;
        for viewer in viewers {
            if Some(viewer.connection_id) == exclude {
                continue;
            }
            if viewer.send(frame.clone()) {
                delivered += 1;
            } else {
                // Partial-failure isolation: a closed connection must not
                // block delivery to the remaining viewers.
                debug!(
                    %asset_id,
                    connection = %viewer.connection_id,
                    "skipping closed connection during broadcast"
                );
            }
        }
        delivered
    }
}
