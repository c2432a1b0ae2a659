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

use super::case_progress_schema::{ProgressInput, ERROR_MESSAGE};
use super::case_progress_shared;

pub struct CaseProgressService {
    pub adapter: OfficeAdapter,
}

impl CaseProgressService {
    pub fn new(state: Arc<OfficeState>) -> Self {
        Self {
            adapter: OfficeAdapter::new(state, StoreKind::CaseProgress),
        }
    }
}

fn parse(data: &Value) -> Result<Value> {
    let input = validate::<ProgressInput>(data, ERROR_MESSAGE)?;
    Ok(serde_json::to_value(&input)?)
}

fn with_author(mut entry: Value, author: Option<&Value>) -> Value {
    if let (Some(obj), Some(author)) = (entry.as_object_mut(), author) {
        obj.insert("author".to_string(), author.clone());
    }
    entry
}

#[async_trait]
impl CausaService<Value, OfficeParams> for CaseProgressService {
    fn methods(&self) -> ServiceMethods {
        case_progress_shared::crud_methods()
    }

    /// Newest first by date, then by entry time.
    async fn find(&self, ctx: &TenantContext, params: OfficeParams) -> Result<Vec<Value>> {
        let mut all = self.adapter._find(ctx).await?;
        if let Some(case_id) = params.query("case_id") {
            all.retain(|p| str_field(p, "case_id") == Some(case_id));
        }
        all.sort_by(|a, b| {
            str_field(b, "date")
                .cmp(&str_field(a, "date"))
                .then_with(|| str_field(b, "created_at").cmp(&str_field(a, "created_at")))
        });
        Ok(all)
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: OfficeParams) -> Result<Value> {
        self.adapter._get(ctx, id).await
    }

    async fn create(&self, ctx: &TenantContext, data: Value, _params: OfficeParams) -> Result<Value> {
        let author = ctx.actor().map(|a| Value::String(a.to_string()));
        let entry = with_author(parse(&data)?, author.as_ref());
        self.adapter._create(ctx, entry).await
    }

    async fn update(&self, ctx: &TenantContext, id: &str, data: Value, _params: OfficeParams) -> Result<Value> {
        let entry = parse(&data)?;
        self.adapter
            ._modify(ctx, id, |existing, _| Ok(with_author(entry, existing.get("author"))))
            .await
    }

    async fn patch(&self, ctx: &TenantContext, id: Option<&str>, data: Value, _params: OfficeParams) -> Result<Value> {
        let id = self.adapter.require_id(id, "Patch requires an id")?;
        self.adapter
            ._modify(ctx, id, |existing, _| {
                let entry = parse(&merge_patch(existing, &data))?;
                Ok(with_author(entry, existing.get("author")))
            })
            .await
    }

    async fn remove(&self, ctx: &TenantContext, id: Option<&str>, _params: OfficeParams) -> Result<Value> {
        self.adapter._remove(ctx, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn entries_carry_the_author_and_sort_by_date() {
        let svc = CaseProgressService::new(Arc::new(OfficeState::default()));
        let bia = TenantContext::new("ana").with_actor("bia");

        for (date, kind) in [("2025-01-10", "PETICAO"), ("2025-03-02", "AUDIENCIA")] {
            svc.create(
                &bia,
                json!({"case_id": "case:1", "date": date, "description": "x", "kind": kind}),
                OfficeParams::default(),
            )
            .await
            .unwrap();
        }
        svc.create(
            &bia,
            json!({"case_id": "case:2", "date": "2025-02-01", "description": "y", "kind": "OUTROS"}),
            OfficeParams::default(),
        )
        .await
        .unwrap();

        let mut params = OfficeParams::default();
        params.query.insert("case_id".into(), "case:1".into());
        let listed = svc.find(&bia, params).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0]["date"], "2025-03-02");
        assert_eq!(listed[0]["author"], "bia");
    }

    #[tokio::test]
    async fn bad_dates_are_unprocessable() {
        let svc = CaseProgressService::new(Arc::new(OfficeState::default()));
        let ana = TenantContext::new("ana").with_actor("ana");
        let err = svc
            .create(
                &ana,
                json!({"case_id": "case:1", "date": "10/01/2025", "description": "x", "kind": "RECURSO"}),
                OfficeParams::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(
            causa_core::CausaError::from_anyhow(&err).unwrap().kind,
            causa_core::ErrorKind::Unprocessable
        );
    }
}
