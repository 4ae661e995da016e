//! Connection registry
//!
//! Tracks, per asset, the set of live connections currently viewing it.
//! Mutations arrive concurrently from every connection's task; broadcasts
//! read a consistent snapshot. Delivery to snapshot members is at-least-once
//! at broadcast time.

use dashmap::DashMap;
use easel_access::{AssetId, Principal};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique identifier of one open connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Generate a new connection id
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One live connection viewing an asset
///
/// Carries the binding (connection, principal) plus the outbound frame
/// channel the transport task drains into the socket.
#[derive(Debug, Clone)]
pub struct ViewerHandle {
    /// Connection identifier
    pub connection_id: ConnectionId,
    /// The authenticated principal behind the connection
    pub principal: Arc<Principal>,
    outbound: mpsc::UnboundedSender<String>,
}

impl ViewerHandle {
    /// Create a handle around an outbound frame channel
    #[inline]
    #[must_use]
    pub fn new(
        connection_id: ConnectionId,
        principal: Arc<Principal>,
        outbound: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            connection_id,
            principal,
            outbound,
        }
    }

    /// Queue a serialized frame for delivery
    ///
    /// Returns `false` if the connection's writer has gone away.
    #[inline]
    pub fn send(&self, frame: String) -> bool {
        self.outbound.send(frame).is_ok()
    }
}

/// Per-asset set of live viewer connections
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    viewers: DashMap<AssetId, HashMap<ConnectionId, ViewerHandle>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a viewer to an asset's set
    pub fn register(&self, asset_id: AssetId, handle: ViewerHandle) {
        self.viewers
            .entry(asset_id)
            .or_default()
            .insert(handle.connection_id, handle);
    }

    /// Remove a viewer; evicts the asset entry when its set empties
    pub fn unregister(&self, asset_id: AssetId, connection_id: ConnectionId) -> Option<ViewerHandle> {
        let removed = {
            let mut entry = self.viewers.get_mut(&asset_id)?;
            entry.remove(&connection_id)
        };
        // No dangling empty sets: drop the asset entry if this was the
        // last viewer. remove_if re-checks under the shard lock, so a
        // concurrent register is not lost.
        self.viewers.remove_if(&asset_id, |_, set| set.is_empty());
        removed
    }

    /// Consistent snapshot of an asset's viewers
    #[must_use]
    pub fn viewers_of(&self, asset_id: AssetId) -> Vec<ViewerHandle> {
        self.viewers
            .get(&asset_id)
            .map(|entry| entry.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of live viewers of an asset
    #[must_use]
    pub fn viewer_count(&self, asset_id: AssetId) -> usize {
        self.viewers.get(&asset_id).map_or(0, |entry| entry.len())
    }

    /// Number of assets with at least one viewer
    #[inline]
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.viewers.len()
    }
}
