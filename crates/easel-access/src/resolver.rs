//! Permission resolver
//!
//! Pure mapping from (access scope, principal) to a capability set. Every
//! unrecognized input (unknown container kind, unknown role key, absent
//! membership) resolves to the empty set; access never fails open.

use crate::config::AccessConfig;
use crate::types::{AccessScope, ContainerId, ContainerKind, Principal, PrincipalId};
use std::collections::BTreeSet;

/// Resolves a principal's member role within a shared container
///
/// Implementations are expected to be cheap lookups (the directory's
/// member table); the resolver calls this at most once per decision.
pub trait MembershipLookup: Send + Sync {
    /// Role key of `principal` within `container`, if a member
    fn role_of(&self, container: ContainerId, principal: PrincipalId) -> Option<String>;
}

/// Pure permission resolver over an immutable role table
///
/// Idempotent and side-effect free; safe to call concurrently from any
/// number of threads without synchronization.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    config: AccessConfig,
}

impl PermissionResolver {
    /// Create a resolver over an explicit role table
    #[inline]
    #[must_use]
    pub fn new(config: AccessConfig) -> Self {
        Self { config }
    }

    /// Create a resolver over the built-in role table
    #[inline]
    #[must_use]
    pub fn with_builtin_roles() -> Self {
        Self::new(AccessConfig::builtin().clone())
    }

    /// The role table this resolver decides against
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// Compute the capability set `principal` holds within `scope`
    ///
    /// - Unscoped (public pool): administrator set for global admins, else
    ///   empty.
    /// - Exclusive container: administrator set for the sole owner or a
    ///   global admin, else empty.
    /// - Shared container: the set bound to the principal's member role;
    ///   non-members and unrecognized role keys get the empty set.
    /// - Unrecognized container kind: empty set.
    #[must_use]
    pub fn resolve(
        &self,
        scope: AccessScope<'_>,
        principal: &Principal,
        membership: &dyn MembershipLookup,
    ) -> BTreeSet<String> {
        match scope {
            AccessScope::Unscoped => {
                if principal.admin {
                    self.config.admin_capabilities()
                } else {
                    BTreeSet::new()
                }
            }
            AccessScope::Container(container) => match container.kind {
                ContainerKind::Exclusive => {
                    if container.owner == principal.id || principal.admin {
                        self.config.admin_capabilities()
                    } else {
                        BTreeSet::new()
                    }
                }
                ContainerKind::Shared => membership
                    .role_of(container.id, principal.id)
                    .map(|role| self.config.capabilities_for(&role))
                    .unwrap_or_default(),
                ContainerKind::Unknown => BTreeSet::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{capability, role};
    use crate::types::Container;
    use std::collections::HashMap;

    struct FixedMembership(HashMap<(ContainerId, PrincipalId), String>);

    impl FixedMembership {
        fn new(entries: &[(u64, u64, &str)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|&(c, p, r)| ((ContainerId(c), PrincipalId(p)), r.to_string()))
                    .collect(),
            )
        }
    }

    impl MembershipLookup for FixedMembership {
        fn role_of(&self, container: ContainerId, principal: PrincipalId) -> Option<String> {
            self.0.get(&(container, principal)).cloned()
        }
    }

    fn resolver() -> PermissionResolver {
        PermissionResolver::with_builtin_roles()
    }

    #[test]
    fn unscoped_admin_gets_admin_set() {
        let admin = Principal::administrator(1, "root");
        let caps = resolver().resolve(AccessScope::Unscoped, &admin, &FixedMembership::new(&[]));
        assert!(caps.contains(capability::ASSET_EDIT));
        assert!(caps.contains(capability::MEMBER_MANAGE));
    }

    #[test]
    fn unscoped_regular_principal_gets_nothing() {
        let user = Principal::new(2, "alice");
        let caps = resolver().resolve(AccessScope::Unscoped, &user, &FixedMembership::new(&[]));
        assert!(caps.is_empty());
    }

    #[test]
    fn exclusive_owner_gets_admin_set() {
        let owner = Principal::new(7, "bob");
        let container = Container::new(10, 7, ContainerKind::Exclusive);
        let caps = resolver().resolve(
            AccessScope::Container(&container),
            &owner,
            &FixedMembership::new(&[]),
        );
        assert!(caps.contains(capability::ASSET_EDIT));
    }

    #[test]
    fn exclusive_non_owner_gets_nothing() {
        let stranger = Principal::new(8, "carol");
        let container = Container::new(10, 7, ContainerKind::Exclusive);
        let caps = resolver().resolve(
            AccessScope::Container(&container),
            &stranger,
            &FixedMembership::new(&[]),
        );
        assert!(caps.is_empty());
    }

    #[test]
    fn exclusive_global_admin_overrides_ownership() {
        let admin = Principal::administrator(1, "root");
        let container = Container::new(10, 7, ContainerKind::Exclusive);
        let caps = resolver().resolve(
            AccessScope::Container(&container),
            &admin,
            &FixedMembership::new(&[]),
        );
        assert!(caps.contains(capability::MEMBER_MANAGE));
    }

    #[test]
    fn shared_member_gets_role_capabilities() {
        let user = Principal::new(3, "dave");
        let container = Container::new(20, 1, ContainerKind::Shared);
        let membership = FixedMembership::new(&[(20, 3, role::EDITOR)]);
        let caps = resolver().resolve(AccessScope::Container(&container), &user, &membership);
        assert!(caps.contains(capability::ASSET_EDIT));
        assert!(!caps.contains(capability::MEMBER_MANAGE));
    }

    #[test]
    fn shared_non_member_gets_nothing() {
        let user = Principal::new(4, "erin");
        let container = Container::new(20, 1, ContainerKind::Shared);
        let caps = resolver().resolve(
            AccessScope::Container(&container),
            &user,
            &FixedMembership::new(&[]),
        );
        assert!(caps.is_empty());
    }

    #[test]
    fn shared_unrecognized_role_fails_closed() {
        let user = Principal::new(5, "frank");
        let container = Container::new(20, 1, ContainerKind::Shared);
        let membership = FixedMembership::new(&[(20, 5, "archivist")]);
        let caps = resolver().resolve(AccessScope::Container(&container), &user, &membership);
        assert!(caps.is_empty());
    }

    #[test]
    fn unknown_container_kind_fails_closed() {
        let admin = Principal::administrator(1, "root");
        let container = Container::new(20, 1, ContainerKind::Unknown);
        let caps = resolver().resolve(
            AccessScope::Container(&container),
            &admin,
            &FixedMembership::new(&[]),
        );
        assert!(caps.is_empty());
    }
}
