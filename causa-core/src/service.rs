use anyhow::Result;
use async_trait::async_trait;

use crate::errors::CausaError;
use crate::tenant::TenantContext;

/// Standard service methods: find, get, create, update, patch, remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceMethodKind {
    Find,
    Get,
    Create,
    Update,
    Patch,
    Remove,
}

impl ServiceMethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMethodKind::Find => "find",
            ServiceMethodKind::Get => "get",
            ServiceMethodKind::Create => "create",
            ServiceMethodKind::Update => "update",
            ServiceMethodKind::Patch => "patch",
            ServiceMethodKind::Remove => "remove",
        }
    }
}

/// The methods a service exposes to transports.
///
/// Adapters (like causa-axum) reject calls to methods that are not listed.
#[derive(Debug, Clone)]
pub struct ServiceMethods {
    pub allowed_methods: Vec<ServiceMethodKind>,
}

impl ServiceMethods {
    pub fn standard_crud() -> Self {
        use ServiceMethodKind::*;
        Self {
            allowed_methods: vec![Find, Get, Create, Update, Patch, Remove],
        }
    }

    pub fn from_methods(methods: Vec<ServiceMethodKind>) -> Self {
        Self {
            allowed_methods: methods,
        }
    }

    pub fn allows(&self, method: ServiceMethodKind) -> bool {
        self.allowed_methods.contains(&method)
    }
}

fn not_implemented(method: ServiceMethodKind) -> anyhow::Error {
    CausaError::not_implemented(format!("Method not implemented: {}", method.as_str())).into_anyhow()
}

/// Core service trait.
///
/// - `find`   → list records of the tenant
/// - `get`    → fetch one by id
/// - `create` → create one
/// - `update` → full replace
/// - `patch`  → partial update
/// - `remove` → delete one
///
/// Every method defaults to `NotImplemented`, so a service only overrides
/// what it supports.
#[async_trait]
pub trait CausaService<R, P = ()>: Send + Sync
where
    R: Send + 'static,
    P: Send + 'static,
{
    fn methods(&self) -> ServiceMethods {
        ServiceMethods::standard_crud()
    }

    async fn find(&self, _ctx: &TenantContext, _params: P) -> Result<Vec<R>> {
        Err(not_implemented(ServiceMethodKind::Find))
    }

    async fn get(&self, _ctx: &TenantContext, _id: &str, _params: P) -> Result<R> {
        Err(not_implemented(ServiceMethodKind::Get))
    }

    async fn create(&self, _ctx: &TenantContext, _data: R, _params: P) -> Result<R> {
        Err(not_implemented(ServiceMethodKind::Create))
    }

    async fn update(&self, _ctx: &TenantContext, _id: &str, _data: R, _params: P) -> Result<R> {
        Err(not_implemented(ServiceMethodKind::Update))
    }

    /// `id` is `None` for "multi" semantics when a service supports them.
    async fn patch(
        &self,
        _ctx: &TenantContext,
        _id: Option<&str>,
        _data: R,
        _params: P,
    ) -> Result<R> {
        Err(not_implemented(ServiceMethodKind::Patch))
    }

    async fn remove(&self, _ctx: &TenantContext, _id: Option<&str>, _params: P) -> Result<R> {
        Err(not_implemented(ServiceMethodKind::Remove))
    }
}
