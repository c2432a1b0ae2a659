use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use causa_core::errors::CausaError;
use causa_core::tenant::TenantContext;
use causa_core::{CausaService, ServiceMethods};
use serde_json::Value;

use crate::services::adapters::office_adapter::{merge_patch, sort_asc_by, str_field};
use crate::services::adapters::{OfficeAdapter, StoreKind};
use crate::services::cascade::Cascade;
use crate::services::{OfficeParams, OfficeState};
use crate::utils::validator::validate;

use super::clients_schema::{ClientInput, ERROR_MESSAGE};
use super::clients_shared;

pub struct ClientsService {
    pub adapter: OfficeAdapter,
    cascade: Cascade,
}

impl ClientsService {
    pub fn new(state: Arc<OfficeState>) -> Self {
        Self {
            adapter: OfficeAdapter::new(Arc::clone(&state), StoreKind::Clients),
            cascade: Cascade::new(state),
        }
    }
}

fn parse(data: &Value) -> Result<(ClientInput, Value)> {
    let input = validate::<ClientInput>(data, ERROR_MESSAGE)?.normalized()?;
    let value = serde_json::to_value(&input)?;
    Ok((input, value))
}

/// Documents are unique within one owner's partition.
fn ensure_unique_document(
    peers: &HashMap<String, Value>,
    document: &str,
    except: Option<&str>,
) -> Result<()> {
    let taken = peers
        .values()
        .filter(|v| str_field(v, "id") != except)
        .any(|v| str_field(v, "document") == Some(document));
    if taken {
        return Err(CausaError::conflict(format!("A client with document {document} already exists"))
            .into_anyhow());
    }
    Ok(())
}

fn matches_query(client: &Value, q: &str) -> bool {
    let needle = q.to_lowercase();
    let digits: String = q.chars().filter(|c| c.is_ascii_digit()).collect();

    let name_hit = str_field(client, "name")
        .map(|n| n.to_lowercase().contains(&needle))
        .unwrap_or(false);
    let doc_hit = !digits.is_empty()
        && str_field(client, "document")
            .map(|d| d.contains(&digits))
            .unwrap_or(false);
    name_hit || doc_hit
}

#[async_trait]
impl CausaService<Value, OfficeParams> for ClientsService {
    fn methods(&self) -> ServiceMethods {
        clients_shared::crud_methods()
    }

    async fn find(&self, ctx: &TenantContext, params: OfficeParams) -> Result<Vec<Value>> {
        let mut all = self.adapter._find(ctx).await?;
        if let Some(q) = params.query("q") {
            all.retain(|c| matches_query(c, q));
        }
        sort_asc_by(&mut all, "name");
        Ok(all)
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: OfficeParams) -> Result<Value> {
        self.adapter._get(ctx, id).await
    }

    async fn create(&self, ctx: &TenantContext, data: Value, _params: OfficeParams) -> Result<Value> {
        let (input, value) = parse(&data)?;
        self.adapter
            ._create_checked(ctx, value, |peers| {
                ensure_unique_document(peers, &input.document, None)
            })
            .await
    }

    async fn update(&self, ctx: &TenantContext, id: &str, data: Value, _params: OfficeParams) -> Result<Value> {
        let (input, value) = parse(&data)?;
        self.adapter
            ._modify(ctx, id, |_, peers| {
                ensure_unique_document(peers, &input.document, Some(id))?;
                Ok(value)
            })
            .await
    }

    async fn patch(&self, ctx: &TenantContext, id: Option<&str>, data: Value, _params: OfficeParams) -> Result<Value> {
        let id = self.adapter.require_id(id, "Patch requires an id")?;
        self.adapter
            ._modify(ctx, id, |existing, peers| {
                let (input, value) = parse(&merge_patch(existing, &data))?;
                ensure_unique_document(peers, &input.document, Some(id))?;
                Ok(value)
            })
            .await
    }

    async fn remove(&self, ctx: &TenantContext, id: Option<&str>, _params: OfficeParams) -> Result<Value> {
        let removed = self.adapter._remove(ctx, id).await?;
        if let Some(id) = str_field(&removed, "id") {
            self.cascade.client_removed(ctx, id).await?;
        }
        Ok(removed)
    }
}
