//! Demo dataset seeding
//!
//! Fills the in-memory collaborator implementations from a JSON fixture so
//! the binary can serve real sessions without a platform behind it. See
//! `demos/seed.json` for the shape.

use crate::config::ConfigError;
use crate::directory::{MemoryDirectory, MemoryIdentity, MemoryMembership};
use easel_access::{Asset, Container, ContainerId, ContainerKind, Principal, PrincipalId};
use serde::Deserialize;
use std::path::Path;

/// One seeded principal with its bearer token
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedPrincipal {
    /// Bearer token the identity provider resolves
    pub token: String,
    /// Principal id
    pub id: u64,
    /// Display name
    pub display_name: String,
    /// Global administrator flag
    #[serde(default)]
    pub admin: bool,
}

/// One seeded container
#[derive(Debug, Clone, Deserialize)]
pub struct SeedContainer {
    /// Container id
    pub id: u64,
    /// Owning principal id
    pub owner: u64,
    /// Access model
    pub kind: ContainerKind,
}

/// One seeded asset
#[derive(Debug, Clone, Deserialize)]
pub struct SeedAsset {
    /// Asset id
    pub id: u64,
    /// Owning container id; absent for the shared public pool
    #[serde(default)]
    pub container: Option<u64>,
}

/// One seeded membership grant
#[derive(Debug, Clone, Deserialize)]
pub struct SeedMembership {
    /// Container id
    pub container: u64,
    /// Member principal id
    pub principal: u64,
    /// Role key within the container
    pub role: String,
}

/// A complete demo dataset
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    /// Principals with tokens
    #[serde(default)]
    pub principals: Vec<SeedPrincipal>,
    /// Containers
    #[serde(default)]
    pub containers: Vec<SeedContainer>,
    /// Assets
    #[serde(default)]
    pub assets: Vec<SeedAsset>,
    /// Membership grants
    #[serde(default)]
    pub memberships: Vec<SeedMembership>,
}

impl SeedData {
    /// Load a dataset from a JSON file
    ///
    /// # Errors
    /// `ConfigError::Io` / `ConfigError::Parse` on unreadable or malformed
    /// input.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Apply the dataset to the in-memory collaborators
    pub fn apply(
        &self,
        identity: &MemoryIdentity,
        directory: &MemoryDirectory,
        membership: &MemoryMembership,
    ) {
        for seed in &self.principals {
            let principal = if seed.admin {
                Principal::administrator(seed.id, seed.display_name.clone())
            } else {
                Principal::new(seed.id, seed.display_name.clone())
            };
            identity.insert(seed.token.clone(), principal);
        }
        for seed in &self.containers {
            directory.insert_container(Container::new(seed.id, seed.owner, seed.kind));
        }
        for seed in &self.assets {
            directory.insert_asset(match seed.container {
                Some(container) => Asset::in_container(seed.id, container),
                None => Asset::unscoped(seed.id),
            });
        }
        for seed in &self.memberships {
            membership.grant(
                ContainerId(seed.container),
                PrincipalId(seed.principal),
                seed.role.clone(),
            );
        }
    }
}
