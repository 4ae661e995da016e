//! Edit-lock state
//!
//! One holder per asset; an absent entry means unlocked. Entries are
//! removed on release, so the map never outgrows the set of assets with an
//! active holder. All transitions run on the pipeline consumer task, which
//! is the sole mutator; the map itself is still concurrency-safe so other
//! contexts may observe holders.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use easel_access::{AssetId, PrincipalId};

/// Per-asset exclusive edit locks
#[derive(Debug, Default)]
pub struct EditLocks {
    holders: DashMap<AssetId, PrincipalId>,
}

impl EditLocks {
    /// Create an empty lock map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock if unlocked; first writer wins
    ///
    /// Returns `false` when any holder (including `principal` itself)
    /// already owns the lock.
    pub fn try_acquire(&self, asset_id: AssetId, principal: PrincipalId) -> bool {
        match self.holders.entry(asset_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(principal);
                true
            }
        }
    }

    /// Release the lock if `principal` is the current holder
    pub fn release_if_holder(&self, asset_id: AssetId, principal: PrincipalId) -> bool {
        self.holders
            .remove_if(&asset_id, |_, holder| *holder == principal)
            .is_some()
    }

    /// Current holder, if the asset is locked
    #[must_use]
    pub fn holder_of(&self, asset_id: AssetId) -> Option<PrincipalId> {
        self.holders.get(&asset_id).map(|entry| *entry)
    }

    /// Whether `principal` currently holds the asset's lock
    #[inline]
    #[must_use]
    pub fn is_holder(&self, asset_id: AssetId, principal: PrincipalId) -> bool {
        self.holder_of(asset_id) == Some(principal)
    }

    /// Number of currently locked assets
    #[inline]
    #[must_use]
    pub fn locked_count(&self) -> usize {
        self.holders.len()
    }
}
