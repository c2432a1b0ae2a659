use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use causa_core::tenant::TenantContext;
use causa_core::{CausaService, ServiceMethods};
use serde_json::Value;

use crate::services::adapters::office_adapter::{merge_patch, str_field};
use crate::services::adapters::{OfficeAdapter, StoreKind};
use crate::services::{OfficeParams, OfficeState};
use crate::utils::validator::validate;

use super::fees_schema::{FeeInput, ERROR_MESSAGE};
use super::fees_shared;

pub struct FeesService {
    pub adapter: OfficeAdapter,
}

impl FeesService {
    pub fn new(state: Arc<OfficeState>) -> Self {
        Self {
            adapter: OfficeAdapter::new(state, StoreKind::Fees),
        }
    }
}

fn parse(data: &Value) -> Result<Value> {
    let input = validate::<FeeInput>(data, ERROR_MESSAGE)?.normalized()?;
    Ok(serde_json::to_value(&input)?)
}

#[async_trait]
impl CausaService<Value, OfficeParams> for FeesService {
    fn methods(&self) -> ServiceMethods {
        fees_shared::crud_methods()
    }

    /// Earliest due first; `paid=true|false` filters, `case_id` narrows to
    /// one case.
    async fn find(&self, ctx: &TenantContext, params: OfficeParams) -> Result<Vec<Value>> {
        let mut all = self.adapter._find(ctx).await?;
        if let Some(paid) = params.query_bool("paid") {
            all.retain(|f| f.get("paid").and_then(Value::as_bool) == Some(paid));
        }
        if let Some(case_id) = params.query("case_id") {
            all.retain(|f| str_field(f, "case_id") == Some(case_id));
        }
        all.sort_by(|a, b| {
            str_field(a, "due_date")
                .cmp(&str_field(b, "due_date"))
                .then_with(|| str_field(a, "id").cmp(&str_field(b, "id")))
        });
        Ok(all)
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: OfficeParams) -> Result<Value> {
        self.adapter._get(ctx, id).await
    }

    async fn create(&self, ctx: &TenantContext, data: Value, _params: OfficeParams) -> Result<Value> {
        self.adapter._create(ctx, parse(&data)?).await
    }

    async fn update(&self, ctx: &TenantContext, id: &str, data: Value, _params: OfficeParams) -> Result<Value> {
        let value = parse(&data)?;
        self.adapter._modify(ctx, id, |_, _| Ok(value)).await
    }

    /// `{"paid": true}` settles a fee.
    async fn patch(&self, ctx: &TenantContext, id: Option<&str>, data: Value, _params: OfficeParams) -> Result<Value> {
        let id = self.adapter.require_id(id, "Patch requires an id")?;
        self.adapter
            ._modify(ctx, id, |existing, _| parse(&merge_patch(existing, &data)))
            .await
    }

    async fn remove(&self, ctx: &TenantContext, id: Option<&str>, _params: OfficeParams) -> Result<Value> {
        self.adapter._remove(ctx, id).await
    }
}
