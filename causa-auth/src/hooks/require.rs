use anyhow::Result;
use async_trait::async_trait;
use causa_core::{CausaBeforeHook, HookContext};

use super::SessionParams;
use crate::capability::Capability;
use crate::gate::{Denial, DenialReason, PermissionGate, FALLBACK_ROUTE_KEY};

fn redirect_target<'a, R, P>(own: &'a Option<String>, ctx: &'a HookContext<R, P>) -> Option<&'a str>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    own.as_deref().or_else(|| ctx.config.get(FALLBACK_ROUTE_KEY))
}

/// Deny the call unless the session holds `capability`.
pub struct RequireCapability {
    gate: PermissionGate,
    capability: Capability,
    redirect: Option<String>,
}

impl RequireCapability {
    pub fn new(gate: PermissionGate, capability: Capability) -> Self {
        Self {
            gate,
            capability,
            redirect: None,
        }
    }

    /// Send denied callers here instead of the configured fallback.
    pub fn redirect_to(mut self, route: impl Into<String>) -> Self {
        self.redirect = Some(route.into());
        self
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }
}

#[async_trait]
impl<R, P> CausaBeforeHook<R, P> for RequireCapability
where
    R: Send + Sync + 'static,
    P: SessionParams + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()> {
        let redirect = redirect_target(&self.redirect, ctx);
        self.gate
            .authorize_with_redirect(ctx.params.session(), self.capability, redirect)
            .await
            .into_result()
    }
}

/// Deny the call unless the caller is the account owner.
pub struct RequireOwner {
    gate: PermissionGate,
    action: String,
    redirect: Option<String>,
}

impl RequireOwner {
    pub fn new(gate: PermissionGate, action: impl Into<String>) -> Self {
        Self {
            gate,
            action: action.into(),
            redirect: None,
        }
    }

    pub fn redirect_to(mut self, route: impl Into<String>) -> Self {
        self.redirect = Some(route.into());
        self
    }
}

#[async_trait]
impl<R, P> CausaBeforeHook<R, P> for RequireOwner
where
    R: Send + Sync + 'static,
    P: SessionParams + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()> {
        let redirect = redirect_target(&self.redirect, ctx);
        self.gate
            .require_owner(ctx.params.session(), &self.action, redirect)
            .into_result()
    }
}

/// Deny anonymous callers; any resolved principal passes.
pub struct RequireSession {
    gate: PermissionGate,
}

impl RequireSession {
    pub fn new(gate: PermissionGate) -> Self {
        Self { gate }
    }
}

#[async_trait]
impl<R, P> CausaBeforeHook<R, P> for RequireSession
where
    R: Send + Sync + 'static,
    P: SessionParams + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()> {
        if ctx.params.session().is_authenticated() {
            return Ok(());
        }
        let redirect = ctx
            .config
            .get(FALLBACK_ROUTE_KEY)
            .unwrap_or(self.gate.fallback())
            .to_string();
        Err(Denial {
            reason: DenialReason::Unauthenticated,
            capability: "authenticated".to_string(),
            message: "Access denied. Please sign in.".to_string(),
            redirect,
        }
        .into_error()
        .into_anyhow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::{DelegateId, OwnerId, Principal, Session, UserId};
    use crate::store::tests::delegate;
    use crate::store::MemoryIdentityStore;
    use crate::CapabilitySet;
    use causa_core::{CausaApp, CausaError, CausaService, ErrorKind, TenantContext};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingService {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CausaService<String, Session> for CountingService {
        async fn find(&self, _ctx: &causa_core::TenantContext, _p: Session) -> Result<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["client:1".into()])
        }

        async fn remove(
            &self,
            _ctx: &causa_core::TenantContext,
            id: Option<&str>,
            _p: Session,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(id.unwrap_or_default().to_string())
        }
    }

    fn bia() -> Session {
        Session::Authenticated(Principal::Delegate {
            user: UserId::new("bia"),
            delegate: DelegateId::new("d1"),
            owner: OwnerId::new("ana"),
        })
    }

    async fn setup() -> (CausaApp<String, Session>, Arc<CountingService>) {
        let store = Arc::new(MemoryIdentityStore::new());
        store
            .insert_delegate(delegate("d1", "ana", "bia"), None)
            .await
            .unwrap();
        store
            .put_capability_set(&DelegateId::new("d1"), CapabilitySet::defaults())
            .await;
        let gate = PermissionGate::new(store);

        let app: CausaApp<String, Session> = CausaApp::new();
        app.set(FALLBACK_ROUTE_KEY, "/home");
        let svc = Arc::new(CountingService::default());
        app.register_service("clients", svc.clone());
        app.service("clients").unwrap().hooks(|h| {
            h.before_find(Arc::new(RequireCapability::new(
                gate.clone(),
                Capability::ListarClientes,
            )));
            h.before_remove(Arc::new(
                RequireCapability::new(gate.clone(), Capability::ExcluirCliente)
                    .redirect_to("/clients"),
            ));
        });
        (app, svc)
    }

    #[tokio::test]
    async fn allowed_calls_reach_the_service() {
        let (app, svc) = setup().await;
        let out = app
            .service("clients")
            .unwrap()
            .find(TenantContext::new("ana"), bia())
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(svc.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn denied_calls_never_reach_the_service() {
        let (app, svc) = setup().await;
        let err = app
            .service("clients")
            .unwrap()
            .remove(TenantContext::new("ana"), Some("client:1"), bia())
            .await
            .unwrap_err();
        assert_eq!(svc.calls.load(Ordering::SeqCst), 0);

        let causa = CausaError::from_anyhow(&err).unwrap();
        assert_eq!(causa.kind, ErrorKind::Forbidden);
        assert_eq!(causa.redirect.as_deref(), Some("/clients"));
        assert!(causa.message.contains("excluir_cliente"));
    }

    #[tokio::test]
    async fn anonymous_goes_to_configured_fallback() {
        let (app, svc) = setup().await;
        let err = app
            .service("clients")
            .unwrap()
            .find(TenantContext::anonymous(), Session::Anonymous)
            .await
            .unwrap_err();
        assert_eq!(svc.calls.load(Ordering::SeqCst), 0);

        let causa = CausaError::from_anyhow(&err).unwrap();
        assert_eq!(causa.kind, ErrorKind::NotAuthenticated);
        assert_eq!(causa.redirect.as_deref(), Some("/home"));
    }

    #[tokio::test]
    async fn owner_only_and_session_hooks() {
        let store = Arc::new(MemoryIdentityStore::new());
        let gate = PermissionGate::new(store);
        let app: CausaApp<String, Session> = CausaApp::new();
        app.register_service("delegates", Arc::new(CountingService::default()));
        app.service("delegates").unwrap().hooks(|h| {
            h.before_find(Arc::new(RequireSession::new(gate.clone())));
            h.before_remove(Arc::new(RequireOwner::new(gate.clone(), "remove_delegate")));
        });
        let delegates = app.service("delegates").unwrap();

        assert!(delegates.find(TenantContext::new("ana"), bia()).await.is_ok());
        assert!(delegates
            .find(TenantContext::anonymous(), Session::Anonymous)
            .await
            .is_err());

        let err = delegates
            .remove(TenantContext::new("ana"), Some("d1"), bia())
            .await
            .unwrap_err();
        let causa = CausaError::from_anyhow(&err).unwrap();
        assert_eq!(causa.kind, ErrorKind::Forbidden);
        assert_eq!(causa.redirect.as_deref(), Some("/dashboard"));

        assert!(delegates
            .remove(TenantContext::new("ana"), Some("d1"), Session::owner("ana"))
            .await
            .is_ok());
    }
}
