//! Easel Access - role-based access model
//!
//! The leaf crate of the coordinator:
//! - Domain identities (principals, assets, containers)
//! - The declarative role→capability table, loaded once at startup
//! - A pure, fail-closed permission resolver
//!
//! # Example
//!
//! ```rust,ignore
//! use easel_access::{AccessScope, PermissionResolver, Principal, capability};
//!
//! let resolver = PermissionResolver::with_builtin_roles();
//! let caps = resolver.resolve(AccessScope::Container(&container), &principal, &membership);
//! if caps.contains(capability::ASSET_EDIT) {
//!     // principal may join the editing session
//! }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod resolver;
pub mod types;

// Re-exports for convenience
pub use config::{capability, role, AccessConfig, AccessConfigError, RoleGrants};
pub use resolver::{MembershipLookup, PermissionResolver};
pub use types::{
    AccessScope, Asset, AssetId, Container, ContainerId, ContainerKind, Principal, PrincipalId,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
