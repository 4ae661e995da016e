//! Handshake gate
//!
//! Authorizes a connection upgrade before any bidirectional traffic. Every
//! step short-circuits to a rejection; a rejected handshake creates no
//! state anywhere. The gate never touches the event pipeline.

use crate::directory::{AssetDirectory, IdentityProvider};
use easel_access::{
    capability, AccessScope, AssetId, ContainerKind, MembershipLookup, PermissionResolver,
    Principal,
};
use std::sync::Arc;
use tracing::{info, warn};
use warp::http::StatusCode;

/// The parts of an upgrade request the gate inspects
#[derive(Debug, Clone, Default)]
pub struct UpgradeRequest {
    /// `assetId` query parameter, as received
    pub asset_id: Option<String>,
    /// Opaque bearer token identifying the principal
    pub auth_token: Option<String>,
}

/// Successful handshake: the binding handed to the session stage
#[derive(Debug, Clone)]
pub struct SessionTicket {
    /// Asset the connection will view
    pub asset_id: AssetId,
    /// Authenticated principal behind the connection
    pub principal: Arc<Principal>,
}

/// Handshake rejection reasons
///
/// Surfaced only as a rejected upgrade; no persistent connection is ever
/// established for any of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandshakeError {
    /// A required request parameter is absent or unparsable
    #[error("missing or invalid parameter: {0}")]
    MissingParameter(&'static str),

    /// The identity provider resolved no principal
    #[error("unauthenticated connection attempt")]
    Unauthenticated,

    /// The asset or its container does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The principal may not join a session on this asset
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
}

impl HandshakeError {
    /// HTTP status the rejected upgrade responds with
    #[must_use]
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

/// Pre-upgrade authorizer for collaborative sessions
pub struct HandshakeGate {
    identity: Arc<dyn IdentityProvider>,
    directory: Arc<dyn AssetDirectory>,
    membership: Arc<dyn MembershipLookup>,
    resolver: PermissionResolver,
}

impl HandshakeGate {
    /// Create a gate over the three collaborator interfaces
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        directory: Arc<dyn AssetDirectory>,
        membership: Arc<dyn MembershipLookup>,
        resolver: PermissionResolver,
    ) -> Self {
        Self {
            identity,
            directory,
            membership,
            resolver,
        }
    }

    /// Authorize one connection attempt
    ///
    /// # Errors
    /// - `MissingParameter` if `assetId` is absent or not a decimal id
    /// - `Unauthenticated` if no principal resolves
    /// - `NotFound` if the asset or its container does not exist
    /// - `Forbidden` if the container is not shared, or the capability set
    ///   lacks `asset:edit`
    pub async fn authorize(&self, request: &UpgradeRequest) -> Result<SessionTicket, HandshakeError> {
        let asset_id = request
            .asset_id
            .as_deref()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(AssetId)
            .ok_or_else(|| {
                warn!("handshake rejected: missing asset parameter");
                HandshakeError::MissingParameter("assetId")
            })?;

        let principal = self
            .identity
            .resolve(request.auth_token.as_deref())
            .await
            .ok_or_else(|| {
                warn!(asset = %asset_id, "handshake rejected: unauthenticated");
                HandshakeError::Unauthenticated
            })?;

        let asset = self.directory.asset(asset_id).await.ok_or_else(|| {
            warn!(asset = %asset_id, "handshake rejected: asset not found");
            HandshakeError::NotFound("asset")
        })?;

        let container = match asset.container_id {
            Some(container_id) => {
                let container = self.directory.container(container_id).await.ok_or_else(|| {
                    warn!(container = %container_id, "handshake rejected: container not found");
                    HandshakeError::NotFound("container")
                })?;
                // Collaborative sessions are only permitted on shared
                // containers; single-owner and unscoped assets do not
                // support multi-viewer editing.
                if container.kind != ContainerKind::Shared {
                    info!(container = %container_id, "handshake rejected: container not shared");
                    return Err(HandshakeError::Forbidden(
                        "collaborative sessions require a shared container",
                    ));
                }
                Some(container)
            }
            None => None,
        };

        let capabilities = self.resolver.resolve(
            AccessScope::of(container.as_ref()),
            &principal,
            self.membership.as_ref(),
        );
        if !capabilities.contains(capability::ASSET_EDIT) {
            warn!(
                asset = %asset_id,
                principal = %principal.id,
                "handshake rejected: missing edit capability"
            );
            return Err(HandshakeError::Forbidden("edit capability required"));
        }

        Ok(SessionTicket {
            asset_id,
            principal: Arc::new(principal),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{MemoryDirectory, MemoryIdentity, MemoryMembership};
    use easel_access::{role, Asset, Container, ContainerId, PrincipalId};

    struct Fixture {
        identity: Arc<MemoryIdentity>,
        directory: Arc<MemoryDirectory>,
        membership: Arc<MemoryMembership>,
        gate: HandshakeGate,
    }

    fn fixture() -> Fixture {
        let identity = Arc::new(MemoryIdentity::new());
        let directory = Arc::new(MemoryDirectory::new());
        let membership = Arc::new(MemoryMembership::new());
        let gate = HandshakeGate::new(
            Arc::clone(&identity) as Arc<dyn IdentityProvider>,
            Arc::clone(&directory) as Arc<dyn AssetDirectory>,
            Arc::clone(&membership) as Arc<dyn MembershipLookup>,
            PermissionResolver::with_builtin_roles(),
        );
        Fixture {
            identity,
            directory,
            membership,
            gate,
        }
    }

    fn request(asset_id: &str, token: &str) -> UpgradeRequest {
        UpgradeRequest {
            asset_id: Some(asset_id.to_string()),
            auth_token: Some(token.to_string()),
        }
    }

    fn seed_shared_asset(fx: &Fixture) {
        fx.directory
            .insert_container(Container::new(10, 1, ContainerKind::Shared));
        fx.directory.insert_asset(Asset::in_container(1, 10));
    }

    #[tokio::test]
    async fn missing_asset_parameter_rejected() {
        let fx = fixture();
        let err = fx
            .gate
            .authorize(&UpgradeRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err, HandshakeError::MissingParameter("assetId"));
        assert_eq!(err.http_status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_decimal_asset_parameter_rejected() {
        let fx = fixture();
        let err = fx.gate.authorize(&request("abc", "t")).await.unwrap_err();
        assert_eq!(err, HandshakeError::MissingParameter("assetId"));
    }

    #[tokio::test]
    async fn unknown_token_rejected() {
        let fx = fixture();
        seed_shared_asset(&fx);
        let err = fx.gate.authorize(&request("1", "nope")).await.unwrap_err();
        assert_eq!(err, HandshakeError::Unauthenticated);
        assert_eq!(err.http_status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_asset_rejected() {
        let fx = fixture();
        fx.identity.insert("t", Principal::new(1, "alice"));
        let err = fx.gate.authorize(&request("404", "t")).await.unwrap_err();
        assert_eq!(err, HandshakeError::NotFound("asset"));
        assert_eq!(err.http_status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_container_rejected() {
        let fx = fixture();
        fx.identity.insert("t", Principal::new(1, "alice"));
        fx.directory.insert_asset(Asset::in_container(1, 10));
        let err = fx.gate.authorize(&request("1", "t")).await.unwrap_err();
        assert_eq!(err, HandshakeError::NotFound("container"));
    }

    #[tokio::test]
    async fn exclusive_container_always_forbidden() {
        let fx = fixture();
        // Even the container owner with the full admin set is rejected.
        fx.identity.insert("t", Principal::new(1, "owner"));
        fx.directory
            .insert_container(Container::new(10, 1, ContainerKind::Exclusive));
        fx.directory.insert_asset(Asset::in_container(1, 10));

        let err = fx.gate.authorize(&request("1", "t")).await.unwrap_err();
        assert!(matches!(err, HandshakeError::Forbidden(_)));
        assert_eq!(err.http_status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn viewer_role_rejected_editor_accepted() {
        let fx = fixture();
        seed_shared_asset(&fx);
        fx.identity.insert("viewer-token", Principal::new(2, "vera"));
        fx.identity.insert("editor-token", Principal::new(3, "ed"));
        fx.membership.grant(ContainerId(10), PrincipalId(2), role::VIEWER);
        fx.membership.grant(ContainerId(10), PrincipalId(3), role::EDITOR);

        let err = fx
            .gate
            .authorize(&request("1", "viewer-token"))
            .await
            .unwrap_err();
        assert!(matches!(err, HandshakeError::Forbidden(_)));

        let ticket = fx.gate.authorize(&request("1", "editor-token")).await.unwrap();
        assert_eq!(ticket.asset_id, AssetId(1));
        assert_eq!(ticket.principal.id, PrincipalId(3));
    }

    #[tokio::test]
    async fn non_member_rejected() {
        let fx = fixture();
        seed_shared_asset(&fx);
        fx.identity.insert("t", Principal::new(9, "stranger"));
        let err = fx.gate.authorize(&request("1", "t")).await.unwrap_err();
        assert!(matches!(err, HandshakeError::Forbidden(_)));
    }

    #[tokio::test]
    async fn unscoped_asset_admits_global_admin() {
        let fx = fixture();
        fx.directory.insert_asset(Asset::unscoped(5));
        fx.identity.insert("root", Principal::administrator(1, "root"));
        fx.identity.insert("user", Principal::new(2, "alice"));

        assert!(fx.gate.authorize(&request("5", "root")).await.is_ok());
        assert!(matches!(
            fx.gate.authorize(&request("5", "user")).await.unwrap_err(),
            HandshakeError::Forbidden(_)
        ));
    }
}
