use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::Result;

use crate::config::{CausaConfig, CausaConfigSnapshot};
use crate::hooks::{
    collect_method_hooks, CausaAfterHook, CausaAroundHook, CausaBeforeHook, CausaErrorHook,
    HookFut,
};
use crate::{
    CausaError, CausaService, HookContext, HookResult, Next, ServiceHooks, ServiceMethodKind,
    ServiceMethods, ServiceRegistry, TenantContext,
};

struct CausaAppInner<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    registry: RwLock<ServiceRegistry<R, P>>,
    global_hooks: RwLock<ServiceHooks<R, P>>,
    service_hooks: RwLock<HashMap<String, ServiceHooks<R, P>>>,
    config: RwLock<CausaConfig>,
}

/// Central application container.
///
/// Framework-agnostic. Holds:
/// - service registry
/// - app hooks
/// - per-service hooks
/// - config
pub struct CausaApp<R, P = ()>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    inner: Arc<CausaAppInner<R, P>>,
}

type HooksForMethod<R, P> = (
    Vec<Arc<dyn CausaAroundHook<R, P>>>,
    Vec<Arc<dyn CausaBeforeHook<R, P>>>,
    Vec<Arc<dyn CausaAfterHook<R, P>>>,
    Vec<Arc<dyn CausaErrorHook<R, P>>>,
);

// A poisoned lock only means another thread panicked mid-write; the maps
// themselves stay usable.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl<R, P> Default for CausaApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, P> Clone for CausaApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, P> CausaApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CausaAppInner {
                registry: RwLock::new(ServiceRegistry::new()),
                global_hooks: RwLock::new(ServiceHooks::new()),
                service_hooks: RwLock::new(HashMap::new()),
                config: RwLock::new(CausaConfig::new()),
            }),
        }
    }

    pub fn register_service<S>(&self, name: S, service: Arc<dyn CausaService<R, P>>)
    where
        S: Into<String>,
    {
        write(&self.inner.registry).register(name, service);
    }

    /// App-wide hooks; they run before any service-level hook.
    pub fn hooks<F>(&self, f: F)
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        let mut g = write(&self.inner.global_hooks);
        f(&mut g);
    }

    pub(crate) fn configure_service_hooks<F>(&self, service_name: &str, f: F)
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        let mut map = write(&self.inner.service_hooks);
        let hooks = map.entry(service_name.to_string()).or_default();
        f(hooks);
    }

    pub fn service(&self, name: &str) -> Result<ServiceHandle<R, P>> {
        let svc = read(&self.inner.registry)
            .get(name)
            .cloned()
            .ok_or_else(|| CausaError::not_found(format!("Service not found: {name}")).into_anyhow())?;

        Ok(ServiceHandle {
            app: self.clone(),
            name: name.to_string(),
            service: svc,
        })
    }

    pub fn service_names(&self) -> Vec<String> {
        read(&self.inner.registry).names()
    }

    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        write(&self.inner.config).set(key, value);
    }

    pub fn set_default<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        write(&self.inner.config).set_default(key, value);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        read(&self.inner.config).get(key).map(|v| v.to_string())
    }

    /// Apply prefixed environment overrides, see [`CausaConfig::load_env`].
    pub fn load_env<I>(&self, prefix: &str, vars: I) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        write(&self.inner.config).load_env(prefix, vars)
    }

    pub fn config_snapshot(&self) -> CausaConfigSnapshot {
        read(&self.inner.config).snapshot()
    }
}

/// A named service plus the app it lives in. Calls made through the handle
/// run the full hook pipeline.
pub struct ServiceHandle<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    app: CausaApp<R, P>,
    name: String,
    service: Arc<dyn CausaService<R, P>>,
}

impl<R, P> ServiceHandle<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub fn hooks<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        self.app.configure_service_hooks(&self.name, f);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inner(&self) -> &Arc<dyn CausaService<R, P>> {
        &self.service
    }

    pub fn methods(&self) -> ServiceMethods {
        self.service.methods()
    }
}

/// What the innermost step of the pipeline should call on the service.
enum ServiceCall {
    Find,
    Get(String),
    Create,
    Update(String),
    Patch(Option<String>),
    Remove(Option<String>),
}

async fn dispatch<R, P>(
    svc: &Arc<dyn CausaService<R, P>>,
    call: &ServiceCall,
    ctx: &mut HookContext<R, P>,
) -> Result<()>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    let params = ctx.params.clone();
    let result = match call {
        ServiceCall::Find => HookResult::Many(svc.find(&ctx.tenant, params).await?),
        ServiceCall::Get(id) => HookResult::One(svc.get(&ctx.tenant, id, params).await?),
        ServiceCall::Create => {
            let data = take_data(ctx, "create")?;
            HookResult::One(svc.create(&ctx.tenant, data, params).await?)
        }
        ServiceCall::Update(id) => {
            let data = take_data(ctx, "update")?;
            HookResult::One(svc.update(&ctx.tenant, id, data, params).await?)
        }
        ServiceCall::Patch(id) => {
            let data = take_data(ctx, "patch")?;
            HookResult::One(svc.patch(&ctx.tenant, id.as_deref(), data, params).await?)
        }
        ServiceCall::Remove(id) => {
            HookResult::One(svc.remove(&ctx.tenant, id.as_deref(), params).await?)
        }
    };
    ctx.result = Some(result);
    Ok(())
}

fn take_data<R, P>(ctx: &mut HookContext<R, P>, method: &str) -> Result<R>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    ctx.data
        .take()
        .ok_or_else(|| CausaError::bad_request(format!("{method}() requires data")).into_anyhow())
}

impl<R, P> ServiceHandle<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    /// Global hooks first, then service hooks.
    fn collect_hooks_for_method(&self, method: &ServiceMethodKind) -> HooksForMethod<R, P> {
        let g = read(&self.app.inner.global_hooks);
        let map = read(&self.app.inner.service_hooks);

        let mut around = collect_method_hooks(&g.around_all, &g.around_by_method, method);
        let mut before = collect_method_hooks(&g.before_all, &g.before_by_method, method);
        let mut after = collect_method_hooks(&g.after_all, &g.after_by_method, method);
        let mut error = collect_method_hooks(&g.error_all, &g.error_by_method, method);

        if let Some(h) = map.get(&self.name) {
            around.extend(collect_method_hooks(&h.around_all, &h.around_by_method, method));
            before.extend(collect_method_hooks(&h.before_all, &h.before_by_method, method));
            after.extend(collect_method_hooks(&h.after_all, &h.after_by_method, method));
            error.extend(collect_method_hooks(&h.error_all, &h.error_by_method, method));
        }

        (around, before, after, error)
    }

    fn context(&self, tenant: TenantContext, method: ServiceMethodKind, params: P) -> HookContext<R, P> {
        HookContext::new(
            tenant,
            method,
            params,
            ServiceCaller::new(self.app.clone()),
            self.app.config_snapshot(),
        )
    }

    /// around → before → service → after (reverse) → error
    async fn run_pipeline(&self, mut ctx: HookContext<R, P>, call: ServiceCall) -> Result<HookContext<R, P>> {
        let (around, before, after, error) = self.collect_hooks_for_method(&ctx.method);
        let svc = self.service.clone();

        let mut next: Next<R, P> = Next::new(move |ctx: &mut HookContext<R, P>| {
            let fut: HookFut<'_> = Box::pin(async move {
                for h in &before {
                    h.run(ctx).await?;
                }

                dispatch(&svc, &call, ctx).await?;

                for h in after.iter().rev() {
                    h.run(ctx).await?;
                }
                Ok(())
            });
            fut
        });

        // first registered around hook ends up outermost
        for h in around.into_iter().rev() {
            let prev = next;
            next = Next::new(move |ctx: &mut HookContext<R, P>| {
                let fut: HookFut<'_> = Box::pin(async move { h.run(ctx, prev).await });
                fut
            });
        }

        if let Err(e) = next.run(&mut ctx).await {
            ctx.error = Some(e);

            for h in &error {
                if let Err(hook_err) = h.run(&mut ctx).await {
                    ctx.error = Some(hook_err);
                }
            }

            if let Some(err) = ctx.error.take() {
                return Err(err);
            }
        }

        Ok(ctx)
    }

    fn one(ctx: HookContext<R, P>, method: &str) -> Result<R> {
        match ctx.result {
            Some(HookResult::One(v)) => Ok(v),
            Some(HookResult::Many(_)) => Err(CausaError::general_error(format!(
                "{method}() produced many results"
            ))
            .into_anyhow()),
            None => Err(CausaError::general_error(format!("{method}() produced no result")).into_anyhow()),
        }
    }

    pub async fn find(&self, tenant: TenantContext, params: P) -> Result<Vec<R>> {
        let ctx = self.context(tenant, ServiceMethodKind::Find, params);
        let ctx = self.run_pipeline(ctx, ServiceCall::Find).await?;

        match ctx.result {
            Some(HookResult::Many(v)) => Ok(v),
            Some(HookResult::One(v)) => Ok(vec![v]),
            None => Ok(vec![]),
        }
    }

    pub async fn get(&self, tenant: TenantContext, id: &str, params: P) -> Result<R> {
        let ctx = self.context(tenant, ServiceMethodKind::Get, params);
        let ctx = self.run_pipeline(ctx, ServiceCall::Get(id.to_string())).await?;
        Self::one(ctx, "get")
    }

    pub async fn create(&self, tenant: TenantContext, data: R, params: P) -> Result<R> {
        let mut ctx = self.context(tenant, ServiceMethodKind::Create, params);
        ctx.data = Some(data);
        let ctx = self.run_pipeline(ctx, ServiceCall::Create).await?;
        Self::one(ctx, "create")
    }

    pub async fn update(&self, tenant: TenantContext, id: &str, data: R, params: P) -> Result<R> {
        let mut ctx = self.context(tenant, ServiceMethodKind::Update, params);
        ctx.data = Some(data);
        let ctx = self.run_pipeline(ctx, ServiceCall::Update(id.to_string())).await?;
        Self::one(ctx, "update")
    }

    pub async fn patch(
        &self,
        tenant: TenantContext,
        id: Option<&str>,
        data: R,
        params: P,
    ) -> Result<R> {
        let mut ctx = self.context(tenant, ServiceMethodKind::Patch, params);
        ctx.data = Some(data);
        let ctx = self
            .run_pipeline(ctx, ServiceCall::Patch(id.map(str::to_string)))
            .await?;
        Self::one(ctx, "patch")
    }

    pub async fn remove(&self, tenant: TenantContext, id: Option<&str>, params: P) -> Result<R> {
        let ctx = self.context(tenant, ServiceMethodKind::Remove, params);
        let ctx = self
            .run_pipeline(ctx, ServiceCall::Remove(id.map(str::to_string)))
            .await?;
        Self::one(ctx, "remove")
    }
}

/// Gives hooks access to sibling services without going through hooks again.
pub struct ServiceCaller<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    app: CausaApp<R, P>,
}

impl<R, P> Clone for ServiceCaller<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: self.app.clone(),
        }
    }
}

impl<R, P> ServiceCaller<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub fn new(app: CausaApp<R, P>) -> Self {
        Self { app }
    }

    pub fn service(&self, name: &str) -> Result<Arc<dyn CausaService<R, P>>> {
        read(&self.app.inner.registry)
            .get(name)
            .cloned()
            .ok_or_else(|| CausaError::not_found(format!("Service not found: {name}")).into_anyhow())
    }

    /// Handle that runs the full pipeline, hooks included.
    pub fn handle(&self, name: &str) -> Result<ServiceHandle<R, P>> {
        self.app.service(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CausaAfterHook, CausaAroundHook, CausaBeforeHook, CausaErrorHook, ErrorKind};
    use async_trait::async_trait;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    #[derive(Default)]
    struct NotesService {
        notes: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl CausaService<String, ()> for NotesService {
        async fn find(&self, ctx: &TenantContext, _params: ()) -> Result<Vec<String>> {
            let notes = self.notes.lock().unwrap();
            Ok(notes
                .iter()
                .filter(|(t, _)| t == ctx.tenant_id.as_str())
                .map(|(_, n)| n.clone())
                .collect())
        }

        async fn get(&self, _ctx: &TenantContext, id: &str, _params: ()) -> Result<String> {
            Err(CausaError::not_found(format!("Note not found: {id}")).into_anyhow())
        }

        async fn create(&self, ctx: &TenantContext, data: String, _params: ()) -> Result<String> {
            self.notes
                .lock()
                .unwrap()
                .push((ctx.tenant_id.0.clone(), data.clone()));
            Ok(data)
        }
    }

    struct Mark(&'static str, Log);

    #[async_trait]
    impl CausaBeforeHook<String, ()> for Mark {
        async fn run(&self, _ctx: &mut HookContext<String, ()>) -> Result<()> {
            self.1.lock().unwrap().push(format!("before:{}", self.0));
            Ok(())
        }
    }

    #[async_trait]
    impl CausaAfterHook<String, ()> for Mark {
        async fn run(&self, _ctx: &mut HookContext<String, ()>) -> Result<()> {
            self.1.lock().unwrap().push(format!("after:{}", self.0));
            Ok(())
        }
    }

    #[async_trait]
    impl CausaAroundHook<String, ()> for Mark {
        async fn run(&self, ctx: &mut HookContext<String, ()>, next: Next<String, ()>) -> Result<()> {
            self.1.lock().unwrap().push(format!("around-in:{}", self.0));
            let res = next.run(ctx).await;
            self.1.lock().unwrap().push(format!("around-out:{}", self.0));
            res
        }
    }

    struct Recover;

    #[async_trait]
    impl CausaErrorHook<String, ()> for Recover {
        async fn run(&self, ctx: &mut HookContext<String, ()>) -> Result<()> {
            ctx.error = None;
            ctx.result = Some(HookResult::One("fallback".to_string()));
            Ok(())
        }
    }

    fn app() -> CausaApp<String, ()> {
        let app = CausaApp::new();
        app.register_service("notes", Arc::new(NotesService::default()));
        app
    }

    #[tokio::test]
    async fn hooks_run_in_pipeline_order() {
        let app = app();
        let log: Log = Arc::default();

        app.hooks(|h| {
            h.around_all(Arc::new(Mark("global", log.clone())));
            h.before_all(Arc::new(Mark("global", log.clone())));
            h.after_all(Arc::new(Mark("global", log.clone())));
        });
        app.service("notes")
            .unwrap()
            .hooks(|h| {
                h.around(ServiceMethodKind::Create, Arc::new(Mark("svc", log.clone())));
                h.before_create(Arc::new(Mark("svc", log.clone())));
                h.after(ServiceMethodKind::Create, Arc::new(Mark("svc", log.clone())));
            });

        let notes = app.service("notes").unwrap();
        notes
            .create(TenantContext::new("a"), "hello".into(), ())
            .await
            .unwrap();

        let got = log.lock().unwrap().clone();
        assert_eq!(
            got,
            vec![
                "around-in:global",
                "around-in:svc",
                "before:global",
                "before:svc",
                "after:svc",
                "after:global",
                "around-out:svc",
                "around-out:global",
            ]
        );
    }

    #[tokio::test]
    async fn method_hooks_do_not_leak_to_other_methods() {
        let app = app();
        let log: Log = Arc::default();
        app.service("notes")
            .unwrap()
            .hooks(|h| {
                h.before_create(Arc::new(Mark("create-only", log.clone())));
            });

        app.service("notes")
            .unwrap()
            .find(TenantContext::new("a"), ())
            .await
            .unwrap();
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn error_hooks_can_recover() {
        let app = app();
        app.service("notes")
            .unwrap()
            .hooks(|h| {
                h.error(ServiceMethodKind::Get, Arc::new(Recover));
            });

        let got = app
            .service("notes")
            .unwrap()
            .get(TenantContext::new("a"), "missing", ())
            .await
            .unwrap();
        assert_eq!(got, "fallback");
    }

    #[tokio::test]
    async fn unrecovered_errors_keep_their_kind() {
        let err = app()
            .service("notes")
            .unwrap()
            .get(TenantContext::new("a"), "missing", ())
            .await
            .unwrap_err();
        let causa = CausaError::from_anyhow(&err).unwrap();
        assert_eq!(causa.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn tenants_only_see_their_own_records() {
        let app = app();
        let notes = app.service("notes").unwrap();
        notes
            .create(TenantContext::new("a"), "a-note".into(), ())
            .await
            .unwrap();
        notes
            .create(TenantContext::new("b"), "b-note".into(), ())
            .await
            .unwrap();

        let a = notes.find(TenantContext::new("a"), ()).await.unwrap();
        assert_eq!(a, vec!["a-note".to_string()]);
    }

    #[test]
    fn unknown_service_is_not_found() {
        let err = app().service("nope").err().unwrap();
        let causa = CausaError::from_anyhow(&err).unwrap();
        assert_eq!(causa.kind, ErrorKind::NotFound);
    }
}
