//! Hook pipeline types.
//!
//! A call runs `around` hooks (first registered is outermost), then
//! `before` hooks in order, the service method, and `after` hooks in
//! reverse order. If anything fails, `error` hooks run and may clear
//! `ctx.error` to recover.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::app::ServiceCaller;
use crate::config::CausaConfigSnapshot;
use crate::service::ServiceMethodKind;
use crate::tenant::TenantContext;

/// Output of a service call as seen by `after` hooks.
#[derive(Debug, Clone, PartialEq)]
pub enum HookResult<R> {
    One(R),
    Many(Vec<R>),
}

/// Context passed to hooks.
///
/// R = record type, P = params type (transport data, session, query).
pub struct HookContext<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub tenant: TenantContext,
    pub method: ServiceMethodKind,
    pub params: P,
    /// Input payload for create/update/patch.
    pub data: Option<R>,
    pub result: Option<HookResult<R>>,
    pub error: Option<anyhow::Error>,
    pub services: ServiceCaller<R, P>,
    pub config: CausaConfigSnapshot,
}

impl<R, P> HookContext<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub fn new(
        tenant: TenantContext,
        method: ServiceMethodKind,
        params: P,
        services: ServiceCaller<R, P>,
        config: CausaConfigSnapshot,
    ) -> Self {
        Self {
            tenant,
            method,
            params,
            data: None,
            result: None,
            error: None,
            services,
            config,
        }
    }
}

pub type HookFut<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

type NextFn<R, P> = Box<dyn for<'a> FnOnce(&'a mut HookContext<R, P>) -> HookFut<'a> + Send>;

/// The rest of the pipeline, handed to `around` hooks.
pub struct Next<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    call: NextFn<R, P>,
}

impl<R, P> Next<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: for<'a> FnOnce(&'a mut HookContext<R, P>) -> HookFut<'a> + Send + 'static,
    {
        Self { call: Box::new(f) }
    }

    pub async fn run(self, ctx: &mut HookContext<R, P>) -> Result<()> {
        (self.call)(ctx).await
    }
}

#[async_trait]
pub trait CausaAroundHook<R, P>: Send + Sync
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>, next: Next<R, P>) -> Result<()>;
}

#[async_trait]
pub trait CausaBeforeHook<R, P>: Send + Sync
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

#[async_trait]
pub trait CausaAfterHook<R, P>: Send + Sync
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

#[async_trait]
pub trait CausaErrorHook<R, P>: Send + Sync
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

type HookList<H> = Vec<Arc<H>>;
type HookMap<H> = HashMap<ServiceMethodKind, HookList<H>>;

/// Hooks registered for the whole app or for one service.
pub struct ServiceHooks<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub(crate) around_all: HookList<dyn CausaAroundHook<R, P>>,
    pub(crate) around_by_method: HookMap<dyn CausaAroundHook<R, P>>,
    pub(crate) before_all: HookList<dyn CausaBeforeHook<R, P>>,
    pub(crate) before_by_method: HookMap<dyn CausaBeforeHook<R, P>>,
    pub(crate) after_all: HookList<dyn CausaAfterHook<R, P>>,
    pub(crate) after_by_method: HookMap<dyn CausaAfterHook<R, P>>,
    pub(crate) error_all: HookList<dyn CausaErrorHook<R, P>>,
    pub(crate) error_by_method: HookMap<dyn CausaErrorHook<R, P>>,
}

impl<R, P> Default for ServiceHooks<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, P> ServiceHooks<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub fn new() -> Self {
        Self {
            around_all: Vec::new(),
            around_by_method: HashMap::new(),
            before_all: Vec::new(),
            before_by_method: HashMap::new(),
            after_all: Vec::new(),
            after_by_method: HashMap::new(),
            error_all: Vec::new(),
            error_by_method: HashMap::new(),
        }
    }

    pub fn around_all(&mut self, hook: Arc<dyn CausaAroundHook<R, P>>) -> &mut Self {
        self.around_all.push(hook);
        self
    }

    pub fn before_all(&mut self, hook: Arc<dyn CausaBeforeHook<R, P>>) -> &mut Self {
        self.before_all.push(hook);
        self
    }

    pub fn after_all(&mut self, hook: Arc<dyn CausaAfterHook<R, P>>) -> &mut Self {
        self.after_all.push(hook);
        self
    }

    pub fn error_all(&mut self, hook: Arc<dyn CausaErrorHook<R, P>>) -> &mut Self {
        self.error_all.push(hook);
        self
    }

    pub fn around(
        &mut self,
        method: ServiceMethodKind,
        hook: Arc<dyn CausaAroundHook<R, P>>,
    ) -> &mut Self {
        self.around_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn before(
        &mut self,
        method: ServiceMethodKind,
        hook: Arc<dyn CausaBeforeHook<R, P>>,
    ) -> &mut Self {
        self.before_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn after(
        &mut self,
        method: ServiceMethodKind,
        hook: Arc<dyn CausaAfterHook<R, P>>,
    ) -> &mut Self {
        self.after_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn error(
        &mut self,
        method: ServiceMethodKind,
        hook: Arc<dyn CausaErrorHook<R, P>>,
    ) -> &mut Self {
        self.error_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn before_find(&mut self, hook: Arc<dyn CausaBeforeHook<R, P>>) -> &mut Self {
        self.before(ServiceMethodKind::Find, hook)
    }

    pub fn before_get(&mut self, hook: Arc<dyn CausaBeforeHook<R, P>>) -> &mut Self {
        self.before(ServiceMethodKind::Get, hook)
    }

    pub fn before_create(&mut self, hook: Arc<dyn CausaBeforeHook<R, P>>) -> &mut Self {
        self.before(ServiceMethodKind::Create, hook)
    }

    pub fn before_update(&mut self, hook: Arc<dyn CausaBeforeHook<R, P>>) -> &mut Self {
        self.before(ServiceMethodKind::Update, hook)
    }

    pub fn before_patch(&mut self, hook: Arc<dyn CausaBeforeHook<R, P>>) -> &mut Self {
        self.before(ServiceMethodKind::Patch, hook)
    }

    pub fn before_remove(&mut self, hook: Arc<dyn CausaBeforeHook<R, P>>) -> &mut Self {
        self.before(ServiceMethodKind::Remove, hook)
    }

    pub fn after_find(&mut self, hook: Arc<dyn CausaAfterHook<R, P>>) -> &mut Self {
        self.after(ServiceMethodKind::Find, hook)
    }

    pub fn after_get(&mut self, hook: Arc<dyn CausaAfterHook<R, P>>) -> &mut Self {
        self.after(ServiceMethodKind::Get, hook)
    }
}

/// `all` hooks first, then the ones registered for `method`.
pub(crate) fn collect_method_hooks<H: ?Sized>(
    all: &[Arc<H>],
    by_method: &HashMap<ServiceMethodKind, Vec<Arc<H>>>,
    method: &ServiceMethodKind,
) -> Vec<Arc<H>> {
    let mut out: Vec<Arc<H>> = all.to_vec();
    if let Some(specific) = by_method.get(method) {
        out.extend(specific.iter().cloned());
    }
    out
}
