use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use causa_auth::{AuthError, CapabilitySet, DelegateId, IdentityStore, MemoryIdentityStore, OwnerId};
use causa_core::errors::CausaError;
use causa_core::tenant::TenantContext;
use causa_core::{CausaService, ServiceMethods};
use serde_json::{json, Value};
use tracing::info;

use crate::services::OfficeParams;

use super::capabilities_shared;

/// Capability sets of the calling owner's delegates, addressed by
/// delegate id.
pub struct CapabilitiesService {
    store: Arc<MemoryIdentityStore>,
}

impl CapabilitiesService {
    pub fn new(store: Arc<MemoryIdentityStore>) -> Self {
        Self { store }
    }

    fn owner_of(ctx: &TenantContext) -> Result<OwnerId> {
        if ctx.is_anonymous() {
            return Err(CausaError::not_authenticated("Authentication required").into_anyhow());
        }
        Ok(OwnerId::new(ctx.tenant_id.as_str()))
    }

    /// A missing set reads as all flags off.
    async fn current(&self, delegate: &DelegateId) -> Result<CapabilitySet> {
        Ok(self
            .store
            .capability_set(delegate)
            .await
            .map_err(AuthError::into_anyhow)?
            .unwrap_or_else(CapabilitySet::empty))
    }

    async fn view(&self, delegate: &DelegateId) -> Result<Value> {
        let set = self.current(delegate).await?;
        Ok(json!({
            "delegate_id": delegate,
            "capabilities": set.to_json(),
        }))
    }
}

#[async_trait]
impl CausaService<Value, OfficeParams> for CapabilitiesService {
    fn methods(&self) -> ServiceMethods {
        capabilities_shared::flag_methods()
    }

    async fn find(&self, ctx: &TenantContext, _params: OfficeParams) -> Result<Vec<Value>> {
        let owner = Self::owner_of(ctx)?;
        let mut out = Vec::new();
        for delegate in self.store.list_delegates(&owner).await {
            out.push(self.view(&delegate.id).await?);
        }
        Ok(out)
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: OfficeParams) -> Result<Value> {
        let owner = Self::owner_of(ctx)?;
        let delegate = self
            .store
            .get_delegate(&owner, &DelegateId::new(id))
            .await
            .map_err(AuthError::into_anyhow)?;
        self.view(&delegate.id).await
    }

    /// `{"flag": bool, ...}`; all or nothing, effective on the next request.
    async fn patch(&self, ctx: &TenantContext, id: Option<&str>, data: Value, _params: OfficeParams) -> Result<Value> {
        let id = id.ok_or_else(|| CausaError::bad_request("Patch requires a delegate id").into_anyhow())?;
        let owner = Self::owner_of(ctx)?;
        let delegate = self
            .store
            .get_delegate(&owner, &DelegateId::new(id))
            .await
            .map_err(AuthError::into_anyhow)?;

        let flags = data
            .as_object()
            .ok_or_else(|| CausaError::bad_request("Expected an object of capability flags").into_anyhow())?;
        let mut set = self.current(&delegate.id).await?;
        set.apply_patch(flags).map_err(AuthError::into_anyhow)?;
        self.store.put_capability_set(&delegate.id, set).await;
        info!(delegate = %delegate.id, %owner, changed = flags.len(), "capability set updated");

        self.view(&delegate.id).await
    }
}
