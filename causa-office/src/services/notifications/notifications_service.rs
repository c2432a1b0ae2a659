use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use causa_core::tenant::TenantContext;
use causa_core::{CausaService, ServiceMethods};
use serde_json::{json, Value};

use crate::services::adapters::office_adapter::sort_desc_by;
use crate::services::adapters::{OfficeAdapter, StoreKind};
use crate::services::{OfficeParams, OfficeState};

use super::notifications_shared::{self, ALL};

/// The acting user's own inbox. Delegates and owners each see only what
/// was addressed to them.
pub struct NotificationsService {
    pub adapter: OfficeAdapter,
}

impl NotificationsService {
    pub fn new(state: Arc<OfficeState>) -> Self {
        Self {
            adapter: OfficeAdapter::new(state, StoreKind::Notifications),
        }
    }
}

#[async_trait]
impl CausaService<Value, OfficeParams> for NotificationsService {
    fn methods(&self) -> ServiceMethods {
        notifications_shared::inbox_methods()
    }

    async fn find(&self, ctx: &TenantContext, _params: OfficeParams) -> Result<Vec<Value>> {
        let mut all = self.adapter._find(ctx).await?;
        sort_desc_by(&mut all, "created_at");
        Ok(all)
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: OfficeParams) -> Result<Value> {
        self.adapter._get(ctx, id).await
    }

    /// Mark one notification read, or all of them for `id = "all"`.
    async fn patch(&self, ctx: &TenantContext, id: Option<&str>, _data: Value, _params: OfficeParams) -> Result<Value> {
        let id = self.adapter.require_id(id, "Patch requires an id")?;
        if id == ALL {
            let changed = self
                .adapter
                ._modify_all(ctx, |n| {
                    if n.get("read").and_then(Value::as_bool) == Some(true) {
                        return false;
                    }
                    n.insert("read".to_string(), Value::Bool(true));
                    true
                })
                .await?;
            return Ok(json!({ "updated": changed.len() }));
        }

        self.adapter
            ._modify(ctx, id, |existing, _| {
                let mut next = existing.clone();
                if let Some(obj) = next.as_object_mut() {
                    obj.insert("read".to_string(), Value::Bool(true));
                }
                Ok(next)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mark_one_then_all_read() {
        let svc = NotificationsService::new(Arc::new(OfficeState::default()));
        let ana = TenantContext::new("ana").with_actor("ana");
        let mut ids = Vec::new();
        for title in ["a", "b", "c"] {
            let n = svc
                .adapter
                ._create_for("ana", json!({"user": "ana", "title": title, "message": "", "read": false}))
                .await
                .unwrap();
            ids.push(n["id"].as_str().unwrap().to_string());
        }

        let one = svc
            .patch(&ana, Some(&ids[0]), json!({}), OfficeParams::default())
            .await
            .unwrap();
        assert_eq!(one["read"], true);

        let all = svc
            .patch(&ana, Some(ALL), json!({}), OfficeParams::default())
            .await
            .unwrap();
        assert_eq!(all["updated"], 2);

        // another user in the same office has an empty inbox
        let bia = TenantContext::new("ana").with_actor("bia");
        assert!(svc.find(&bia, OfficeParams::default()).await.unwrap().is_empty());
        assert!(svc.get(&bia, &ids[0], OfficeParams::default()).await.is_err());
    }
}
