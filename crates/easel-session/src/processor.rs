//! Edit-lock state machine application
//!
//! Runs exclusively on the pipeline consumer task. Lock contention is
//! policy, not failure: a rejected enter or a non-holder action is a
//! silent no-op, and clients learn lock state only from the broadcasts
//! that do go out.

use crate::broadcast::BroadcastDispatcher;
use crate::lock::EditLocks;
use crate::message::Notification;
use crate::pipeline::{EditEvent, EditEventKind};
use crate::registry::ConnectionId;
use easel_access::{AssetId, Principal, PrincipalId};
use std::sync::Arc;
use tracing::{debug, info};

/// Applies inbound events to the edit-lock state machine and broadcasts
/// the resulting notifications
#[derive(Debug, Clone)]
pub struct SessionProcessor {
    locks: Arc<EditLocks>,
    dispatcher: BroadcastDispatcher,
}

impl SessionProcessor {
    /// Create a processor over the lock map and dispatcher
    #[inline]
    #[must_use]
    pub fn new(locks: Arc<EditLocks>, dispatcher: BroadcastDispatcher) -> Self {
        Self { locks, dispatcher }
    }

    /// The lock map this processor mutates
    #[inline]
    #[must_use]
    pub fn locks(&self) -> &Arc<EditLocks> {
        &self.locks
    }

    /// Apply one event; the sole mutation path for edit-lock state
    pub fn apply(&self, event: EditEvent) {
        match event.kind {
            EditEventKind::EnterEdit => {
                self.enter_edit(event.asset_id, &event.principal);
            }
            EditEventKind::EditAction { ref action } => {
                self.edit_action(event.asset_id, event.connection_id, &event.principal, action);
            }
            EditEventKind::ExitEdit => {
                self.exit_edit(event.asset_id, &event.principal);
            }
            EditEventKind::Disconnected => {
                self.disconnected(event.asset_id, &event.principal);
            }
        }
    }

    fn enter_edit(&self, asset_id: AssetId, principal: &Arc<Principal>) {
        if self.locks.try_acquire(asset_id, principal.id) {
            info!(asset = %asset_id, principal = %principal.id, "edit lock acquired");
            self.dispatcher
                .broadcast(asset_id, &Notification::enter_edit(principal), None);
            return;
        }

        // A holder whose disconnection event was shed can leave a stale
        // lock behind; reclaim it when the holder no longer has a live
        // connection to the asset.
        if let Some(holder) = self.locks.holder_of(asset_id) {
            if !self.holder_present(asset_id, holder)
                && self.locks.release_if_holder(asset_id, holder)
                && self.locks.try_acquire(asset_id, principal.id)
            {
                info!(
                    asset = %asset_id,
                    principal = %principal.id,
                    stale_holder = %holder,
                    "edit lock reclaimed from departed holder"
                );
                self.dispatcher
                    .broadcast(asset_id, &Notification::enter_edit(principal), None);
                return;
            }
        }

        // First writer wins; the loser gets no reply at all.
        debug!(asset = %asset_id, principal = %principal.id, "enter edit ignored, asset locked");
    }

    fn edit_action(
        &self,
        asset_id: AssetId,
        connection_id: ConnectionId,
        principal: &Arc<Principal>,
        action: &str,
    ) {
        if !self.locks.is_holder(asset_id, principal.id) {
            debug!(asset = %asset_id, principal = %principal.id, "edit action from non-holder dropped");
            return;
        }
        // The originator already applied the action locally; echoing it
        // back would double-apply it.
        self.dispatcher.broadcast(
            asset_id,
            &Notification::edit_action(principal, action),
            Some(connection_id),
        );
    }

    fn exit_edit(&self, asset_id: AssetId, principal: &Arc<Principal>) {
        if self.locks.release_if_holder(asset_id, principal.id) {
            info!(asset = %asset_id, principal = %principal.id, "edit lock released");
            self.dispatcher
                .broadcast(asset_id, &Notification::exit_edit(principal), None);
        } else {
            debug!(asset = %asset_id, principal = %principal.id, "exit edit from non-holder dropped");
        }
    }

    /// Connection close, routed through the same ordered path as every
    /// other event so the single-writer invariant holds
    fn disconnected(&self, asset_id: AssetId, principal: &Arc<Principal>) {
        if self.locks.release_if_holder(asset_id, principal.id) {
            info!(asset = %asset_id, principal = %principal.id, "edit lock released on disconnect");
            self.dispatcher
                .broadcast(asset_id, &Notification::exit_edit(principal), None);
        }
        self.dispatcher.broadcast(
            asset_id,
            &Notification::info(
                format!("{} left the session", principal.display_name),
                principal,
            ),
            None,
        );
    }

    fn holder_present(&self, asset_id: AssetId, holder: PrincipalId) -> bool {
        self.dispatcher
            .registry()
            .viewers_of(asset_id)
            .iter()
            .any(|viewer| viewer.principal.id == holder)
    }
}
