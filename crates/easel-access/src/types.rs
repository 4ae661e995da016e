//! Domain types for the access model
//!
//! Defines the identities and grouping entities the coordinator reasons
//! about:
//! - Principals (authenticated users)
//! - Assets (the shared resources being edited)
//! - Containers (the grouping entity with an access model)

use serde::{Deserialize, Serialize};

/// Unique principal (user) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PrincipalId(pub u64);

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique asset identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique container identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub u64);

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An authenticated actor
///
/// Owned by the identity provider; the coordinator only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Principal identifier
    pub id: PrincipalId,
    /// Human-readable name used in broadcast messages
    pub display_name: String,
    /// Whether this principal is a global administrator
    pub admin: bool,
}

impl Principal {
    /// Create a regular (non-administrator) principal
    #[inline]
    #[must_use]
    pub fn new(id: u64, display_name: impl Into<String>) -> Self {
        Self {
            id: PrincipalId(id),
            display_name: display_name.into(),
            admin: false,
        }
    }

    /// Create a global administrator principal
    #[inline]
    #[must_use]
    pub fn administrator(id: u64, display_name: impl Into<String>) -> Self {
        Self {
            id: PrincipalId(id),
            display_name: display_name.into(),
            admin: true,
        }
    }
}

/// The shared resource being collaboratively edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Asset identifier
    pub id: AssetId,
    /// Owning container, if any; `None` means the shared public pool
    pub container_id: Option<ContainerId>,
}

impl Asset {
    /// Create an asset belonging to a container
    #[inline]
    #[must_use]
    pub fn in_container(id: u64, container_id: u64) -> Self {
        Self {
            id: AssetId(id),
            container_id: Some(ContainerId(container_id)),
        }
    }

    /// Create an asset in the shared public pool
    #[inline]
    #[must_use]
    pub fn unscoped(id: u64) -> Self {
        Self {
            id: AssetId(id),
            container_id: None,
        }
    }
}

/// Access model of a container
///
/// `Unknown` is the serde catch-all for values this process does not
/// recognize; every permission decision on it fails closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerKind {
    /// Single-owner container; only the owner (or a global admin) has access
    Exclusive,
    /// Multi-member container with per-member roles
    Shared,
    /// Unrecognized access model
    #[serde(other)]
    Unknown,
}

/// The grouping entity an asset may belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Container identifier
    pub id: ContainerId,
    /// The container's sole owner
    pub owner: PrincipalId,
    /// Access model governing multi-user access
    pub kind: ContainerKind,
}

impl Container {
    /// Create a container
    #[inline]
    #[must_use]
    pub fn new(id: u64, owner: u64, kind: ContainerKind) -> Self {
        Self {
            id: ContainerId(id),
            owner: PrincipalId(owner),
            kind,
        }
    }
}

/// Resolver input: the scope an access decision is made against
#[derive(Debug, Clone, Copy)]
pub enum AccessScope<'a> {
    /// No container: the shared public pool
    Unscoped,
    /// A concrete container
    Container(&'a Container),
}

impl<'a> AccessScope<'a> {
    /// Build a scope from an optional container reference
    #[inline]
    #[must_use]
    pub fn of(container: Option<&'a Container>) -> Self {
        match container {
            Some(c) => Self::Container(c),
            None => Self::Unscoped,
        }
    }
}
