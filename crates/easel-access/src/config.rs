//! Role→capability table
//!
//! The table is loaded once at process start from a declarative JSON source
//! (the built-in `access_roles.json`, or an operator-supplied file) and is
//! immutable for the process lifetime. There is no hot reload.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Capability strings granted by roles
pub mod capability {
    /// View an asset
    pub const ASSET_VIEW: &str = "asset:view";
    /// Upload a new asset revision
    pub const ASSET_UPLOAD: &str = "asset:upload";
    /// Edit an asset (required for a collaborative session)
    pub const ASSET_EDIT: &str = "asset:edit";
    /// Delete an asset
    pub const ASSET_DELETE: &str = "asset:delete";
    /// Manage container membership
    pub const MEMBER_MANAGE: &str = "member:manage";
}

/// Well-known role keys of the built-in table
pub mod role {
    /// Read-only member
    pub const VIEWER: &str = "viewer";
    /// Member allowed to edit assets
    pub const EDITOR: &str = "editor";
    /// Container administrator (also the grant set for global admins)
    pub const ADMIN: &str = "admin";
}

/// One role and the capabilities it grants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrants {
    /// Unique role key
    pub key: String,
    /// Human-readable label
    pub label: String,
    /// Capability strings granted to holders of this role
    pub capabilities: Vec<String>,
}

/// Errors loading or validating the role table
#[derive(Debug, thiserror::Error)]
pub enum AccessConfigError {
    /// Role table file could not be read
    #[error("failed to read role table {path}: {source}")]
    Io {
        /// Offending path
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Role table is not valid JSON of the expected shape
    #[error("invalid role table: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two roles share the same key
    #[error("duplicate role key: {0}")]
    DuplicateRole(String),
}

/// The immutable role→capability table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Declared roles, in declaration order
    roles: Vec<RoleGrants>,
}

static BUILTIN: Lazy<AccessConfig> = Lazy::new(|| {
    AccessConfig::from_json(include_str!("../config/access_roles.json"))
        .expect("built-in role table is valid")
});

impl AccessConfig {
    /// Parse a role table from JSON
    ///
    /// # Errors
    /// - `AccessConfigError::Parse` if the JSON is malformed
    /// - `AccessConfigError::DuplicateRole` if a role key repeats
    pub fn from_json(json: &str) -> Result<Self, AccessConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a role table from a JSON file
    ///
    /// # Errors
    /// - `AccessConfigError::Io` if the file cannot be read
    /// - `AccessConfigError::Parse` / `DuplicateRole` as for [`Self::from_json`]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AccessConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| AccessConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The built-in role table shipped with the binary
    #[inline]
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// Capabilities granted by `role_key`
    ///
    /// An unrecognized role key yields the empty set (fail-closed).
    #[must_use]
    pub fn capabilities_for(&self, role_key: &str) -> BTreeSet<String> {
        self.roles
            .iter()
            .find(|r| r.key == role_key)
            .map(|r| r.capabilities.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The administrator capability set
    #[inline]
    #[must_use]
    pub fn admin_capabilities(&self) -> BTreeSet<String> {
        self.capabilities_for(role::ADMIN)
    }

    /// Declared roles, in declaration order
    #[inline]
    #[must_use]
    pub fn roles(&self) -> &[RoleGrants] {
        &self.roles
    }

    fn validate(&self) -> Result<(), AccessConfigError> {
        let mut seen = BTreeSet::new();
        for role in &self.roles {
            if !seen.insert(role.key.as_str()) {
                return Err(AccessConfigError::DuplicateRole(role.key.clone()));
            }
        }
        Ok(())
    }
}
