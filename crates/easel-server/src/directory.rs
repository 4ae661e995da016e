//! Collaborator interfaces
//!
//! The coordinator treats the rest of the platform as three narrow
//! interfaces: an identity provider resolving a connection's principal, an
//! asset/container directory, and a membership lookup (defined in
//! `easel-access`). The in-memory implementations back the integration
//! tests and the demo binary; a production deployment substitutes its own.

use async_trait::async_trait;
use dashmap::DashMap;
use easel_access::{
    Asset, AssetId, Container, ContainerId, MembershipLookup, Principal, PrincipalId,
};

/// Resolves a connection attempt's authenticated principal
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Principal behind `token`, or `None` for an unauthenticated attempt
    async fn resolve(&self, token: Option<&str>) -> Option<Principal>;
}

/// Resolves assets and their owning containers
#[async_trait]
pub trait AssetDirectory: Send + Sync {
    /// Look up an asset by id
    async fn asset(&self, id: AssetId) -> Option<Asset>;
    /// Look up a container by id
    async fn container(&self, id: ContainerId) -> Option<Container>;
}

/// In-memory identity provider keyed by opaque bearer token
#[derive(Debug, Default)]
pub struct MemoryIdentity {
    tokens: DashMap<String, Principal>,
}

impl MemoryIdentity {
    /// Create an empty provider
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token→principal binding
    pub fn insert(&self, token: impl Into<String>, principal: Principal) {
        self.tokens.insert(token.into(), principal);
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn resolve(&self, token: Option<&str>) -> Option<Principal> {
        let token = token?;
        self.tokens.get(token).map(|entry| entry.clone())
    }
}

/// In-memory asset/container directory
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    assets: DashMap<AssetId, Asset>,
    containers: DashMap<ContainerId, Container>,
}

impl MemoryDirectory {
    /// Create an empty directory
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset
    pub fn insert_asset(&self, asset: Asset) {
        self.assets.insert(asset.id, asset);
    }

    /// Register a container
    pub fn insert_container(&self, container: Container) {
        self.containers.insert(container.id, container);
    }
}

#[async_trait]
impl AssetDirectory for MemoryDirectory {
    async fn asset(&self, id: AssetId) -> Option<Asset> {
        self.assets.get(&id).map(|entry| *entry)
    }

    async fn container(&self, id: ContainerId) -> Option<Container> {
        self.containers.get(&id).map(|entry| *entry)
    }
}

/// In-memory membership table for shared containers
#[derive(Debug, Default)]
pub struct MemoryMembership {
    roles: DashMap<(ContainerId, PrincipalId), String>,
}

impl MemoryMembership {
    /// Create an empty membership table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `principal` the role `role` within `container`
    pub fn grant(&self, container: ContainerId, principal: PrincipalId, role: impl Into<String>) {
        self.roles.insert((container, principal), role.into());
    }
}

impl MembershipLookup for MemoryMembership {
    fn role_of(&self, container: ContainerId, principal: PrincipalId) -> Option<String> {
        self.roles
            .get(&(container, principal))
            .map(|entry| entry.clone())
    }
}
