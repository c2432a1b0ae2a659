use std::sync::Arc;

use tracing::{debug, warn};

use crate::principal::{Principal, Session, UserId};
use crate::store::IdentityStore;

/// Builds a [`Session`] from the identity the login layer authenticated.
///
/// One point lookup per request: is this login linked to a delegate? If so
/// the principal is that delegate under its owner, otherwise the login is
/// an owner in its own right. Anything ambiguous resolves to `Anonymous`.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    pub async fn resolve_session(&self, user: Option<&str>) -> Session {
        let Some(user) = user.map(str::trim).filter(|u| !u.is_empty()) else {
            return Session::Anonymous;
        };
        let user = UserId::new(user);

        match self.store.delegate_for_user(&user).await {
            Ok(None) => match self.store.claim_owner(&user).await {
                Ok(()) => Session::Authenticated(Principal::Owner { user }),
                Err(e) => {
                    warn!(user = %user, error = %e, "owner claim rejected, treating as anonymous");
                    Session::Anonymous
                }
            },
            Ok(Some(delegate)) if !delegate.active => {
                debug!(user = %user, delegate = %delegate.id, "inactive delegate login");
                Session::Anonymous
            }
            Ok(Some(delegate)) => Session::Authenticated(Principal::Delegate {
                user,
                delegate: delegate.id,
                owner: delegate.owner,
            }),
            Err(e) => {
                warn!(user = %user, error = %e, "identity lookup failed, treating as anonymous");
                Session::Anonymous
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AuthError, AuthResult};
    use crate::principal::{resolve_owner, DelegateId, OwnerId};
    use crate::store::tests::delegate;
    use crate::store::{DelegateChanges, DelegateRecord, MemoryIdentityStore};
    use crate::CapabilitySet;
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl IdentityStore for BrokenStore {
        async fn delegate_for_user(&self, _user: &UserId) -> AuthResult<Option<DelegateRecord>> {
            Err(AuthError::Store("connection refused".into()))
        }

        async fn capability_set(&self, _d: &DelegateId) -> AuthResult<Option<CapabilitySet>> {
            Err(AuthError::Store("connection refused".into()))
        }
    }

    async fn resolver_with_bia() -> (Arc<MemoryIdentityStore>, IdentityResolver) {
        let store = Arc::new(MemoryIdentityStore::new());
        store
            .insert_delegate(delegate("d1", "ana", "bia"), None)
            .await
            .unwrap();
        (store.clone(), IdentityResolver::new(store))
    }

    #[tokio::test]
    async fn unlinked_login_is_an_owner() {
        let (_, resolver) = resolver_with_bia().await;
        let session = resolver.resolve_session(Some("ana")).await;
        assert_eq!(session, Session::owner("ana"));
        assert_eq!(resolve_owner(&session), Some(OwnerId::new("ana")));
    }

    #[tokio::test]
    async fn delegate_login_resolves_to_owner() {
        let (_, resolver) = resolver_with_bia().await;
        let session = resolver.resolve_session(Some("bia")).await;
        assert_eq!(resolve_owner(&session), Some(OwnerId::new("ana")));
        assert_eq!(
            session.principal().and_then(Principal::delegate),
            Some(&DelegateId::new("d1"))
        );
    }

    #[tokio::test]
    async fn missing_or_blank_identity_is_anonymous() {
        let (_, resolver) = resolver_with_bia().await;
        assert_eq!(resolver.resolve_session(None).await, Session::Anonymous);
        assert_eq!(resolver.resolve_session(Some("  ")).await, Session::Anonymous);
    }

    #[tokio::test]
    async fn inactive_and_removed_delegates_are_anonymous() {
        let (store, resolver) = resolver_with_bia().await;
        let owner = OwnerId::new("ana");
        let id = DelegateId::new("d1");

        store
            .update_delegate(
                &owner,
                &id,
                DelegateChanges {
                    name: "Bia".into(),
                    email: "bia@office.test".into(),
                    phone: String::new(),
                    role: crate::DelegateRole::Sec,
                    active: false,
                },
            )
            .await
            .unwrap();
        assert_eq!(resolver.resolve_session(Some("bia")).await, Session::Anonymous);

        store.remove_delegate(&owner, &id).await.unwrap();
        assert_eq!(resolver.resolve_session(Some("bia")).await, Session::Anonymous);
    }

    #[tokio::test]
    async fn resolved_owner_logins_stay_owners() {
        let (store, resolver) = resolver_with_bia().await;
        assert_eq!(resolver.resolve_session(Some("caio")).await, Session::owner("caio"));

        let res = store.insert_delegate(delegate("d2", "ana", "caio"), None).await;
        assert!(matches!(res, Err(AuthError::Duplicate { field: "username", .. })));
        assert_eq!(resolver.resolve_session(Some("caio")).await, Session::owner("caio"));
    }

    #[tokio::test]
    async fn store_failure_fails_closed() {
        let resolver = IdentityResolver::new(Arc::new(BrokenStore));
        assert_eq!(resolver.resolve_session(Some("ana")).await, Session::Anonymous);
    }
}
