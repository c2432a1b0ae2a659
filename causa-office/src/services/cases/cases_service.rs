use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use causa_core::errors::CausaError;
use causa_core::tenant::TenantContext;
use causa_core::{CausaService, ServiceMethods};
use serde_json::Value;

use crate::services::adapters::office_adapter::{merge_patch, sort_desc_by, str_field};
use crate::services::adapters::{OfficeAdapter, StoreKind};
use crate::services::cascade::Cascade;
use crate::services::{OfficeParams, OfficeState};
use crate::utils::validator::validate;

use super::cases_schema::{CaseInput, CaseStatus, CaseStatusPatch, ERROR_MESSAGE};
use super::cases_shared;

pub struct CasesService {
    pub adapter: OfficeAdapter,
    clients: OfficeAdapter,
    cascade: Cascade,
}

impl CasesService {
    pub fn new(state: Arc<OfficeState>) -> Self {
        Self {
            adapter: OfficeAdapter::new(Arc::clone(&state), StoreKind::Cases),
            clients: OfficeAdapter::new(Arc::clone(&state), StoreKind::Clients),
            cascade: Cascade::new(state),
        }
    }

    async fn client_names(&self, ctx: &TenantContext) -> Result<HashMap<String, String>> {
        Ok(self
            .clients
            ._find(ctx)
            .await?
            .iter()
            .filter_map(|c| {
                Some((
                    str_field(c, "id")?.to_string(),
                    str_field(c, "name")?.to_string(),
                ))
            })
            .collect())
    }
}

fn parse(data: &Value) -> Result<Value> {
    let input = validate::<CaseInput>(data, ERROR_MESSAGE)?.normalized();
    Ok(serde_json::to_value(&input)?)
}

/// Case numbers are unique within one owner's partition.
fn ensure_unique_number(peers: &HashMap<String, Value>, case: &Value, except: Option<&str>) -> Result<()> {
    let number = str_field(case, "number");
    let taken = peers
        .values()
        .filter(|v| str_field(v, "id") != except)
        .any(|v| str_field(v, "number") == number);
    if taken {
        return Err(CausaError::conflict(format!(
            "A case with number {} already exists",
            number.unwrap_or_default()
        ))
        .into_anyhow());
    }
    Ok(())
}

fn with_client_name(mut case: Value, names: &HashMap<String, String>) -> Value {
    let name = str_field(&case, "client_id")
        .and_then(|id| names.get(id))
        .cloned()
        .unwrap_or_default();
    if let Some(obj) = case.as_object_mut() {
        obj.insert("client_name".to_string(), Value::String(name));
    }
    case
}

fn status_of(case: &Value) -> CaseStatus {
    serde_json::from_value(case.get("status").cloned().unwrap_or(Value::Null)).unwrap_or_default()
}

fn matches_query(case: &Value, q: &str) -> bool {
    let needle = q.to_lowercase();
    ["number", "client_name", "description"]
        .iter()
        .filter_map(|f| str_field(case, f))
        .any(|v| v.to_lowercase().contains(&needle))
}

#[async_trait]
impl CausaService<Value, OfficeParams> for CasesService {
    fn methods(&self) -> ServiceMethods {
        cases_shared::crud_methods()
    }

    /// Active cases by default; `archived=true` lists the archive instead.
    async fn find(&self, ctx: &TenantContext, params: OfficeParams) -> Result<Vec<Value>> {
        let archived = params.query_bool("archived").unwrap_or(false);
        let area = params.query("area").map(|a| a.to_uppercase());
        let names = self.client_names(ctx).await?;

        let mut out: Vec<Value> = self
            .adapter
            ._find(ctx)
            .await?
            .into_iter()
            .filter(|c| status_of(c).is_archived() == archived)
            .filter(|c| match &area {
                Some(area) => str_field(c, "practice_area") == Some(area.as_str()),
                None => true,
            })
            .map(|c| with_client_name(c, &names))
            .collect();
        if let Some(q) = params.query("q") {
            out.retain(|c| matches_query(c, q));
        }
        sort_desc_by(&mut out, "created_at");
        Ok(out)
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: OfficeParams) -> Result<Value> {
        let case = self.adapter._get(ctx, id).await?;
        let names = self.client_names(ctx).await?;
        Ok(with_client_name(case, &names))
    }

    async fn create(&self, ctx: &TenantContext, data: Value, _params: OfficeParams) -> Result<Value> {
        let mut value = parse(&data)?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "responsible".to_string(),
                Value::String(ctx.tenant_id.as_str().to_string()),
            );
        }
        let check = value.clone();
        self.adapter
            ._create_checked(ctx, value, |peers| ensure_unique_number(peers, &check, None))
            .await
    }

    async fn update(&self, ctx: &TenantContext, id: &str, data: Value, _params: OfficeParams) -> Result<Value> {
        let mut value = parse(&data)?;
        self.adapter
            ._modify(ctx, id, |existing, peers| {
                ensure_unique_number(peers, &value, Some(id))?;
                if let (Some(obj), Some(responsible)) = (value.as_object_mut(), existing.get("responsible")) {
                    obj.insert("responsible".to_string(), responsible.clone());
                }
                Ok(value)
            })
            .await
    }

    /// Archive or unarchive; nothing else may change through a patch.
    async fn patch(&self, ctx: &TenantContext, id: Option<&str>, data: Value, _params: OfficeParams) -> Result<Value> {
        let id = self.adapter.require_id(id, "Patch requires an id")?;
        let change = validate::<CaseStatusPatch>(&data, ERROR_MESSAGE)?;
        let data = serde_json::to_value(&change)?;
        self.adapter
            ._modify(ctx, id, |existing, _| Ok(merge_patch(existing, &data)))
            .await
    }

    async fn remove(&self, ctx: &TenantContext, id: Option<&str>, _params: OfficeParams) -> Result<Value> {
        let removed = self.adapter._remove(ctx, id).await?;
        if let Some(id) = str_field(&removed, "id") {
            self.cascade.case_removed(ctx, id).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clients::ClientsService;
    use causa_core::ErrorKind;
    use serde_json::json;

    fn ana() -> TenantContext {
        TenantContext::new("ana").with_actor("ana")
    }

    async fn seeded() -> (CasesService, String) {
        let state = Arc::new(OfficeState::default());
        let clients = ClientsService::new(Arc::clone(&state));
        let client = clients
            .create(
                &ana(),
                json!({
                    "name": "Maria Souza",
                    "document": "12345678909",
                    "phone": "11999990000",
                    "practice_area": "CIVIL"
                }),
                OfficeParams::default(),
            )
            .await
            .unwrap();
        (CasesService::new(state), client["id"].as_str().unwrap().to_string())
    }

    fn case(number: &str, client_id: &str) -> Value {
        json!({
            "number": number,
            "client_id": client_id,
            "description": "Ação de cobrança",
            "practice_area": "CIVIL"
        })
    }

    #[tokio::test]
    async fn numbers_are_unique_and_status_defaults_to_active() {
        let (svc, client_id) = seeded().await;
        let created = svc
            .create(&ana(), case("0001", &client_id), OfficeParams::default())
            .await
            .unwrap();
        assert_eq!(created["status"], "ANDAMENTO");
        assert_eq!(created["responsible"], "ana");

        let err = svc
            .create(&ana(), case("0001", &client_id), OfficeParams::default())
            .await
            .unwrap_err();
        assert_eq!(CausaError::from_anyhow(&err).unwrap().kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn archiving_moves_the_case_between_listings() {
        let (svc, client_id) = seeded().await;
        let created = svc
            .create(&ana(), case("0001", &client_id), OfficeParams::default())
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap();

        svc.patch(&ana(), Some(id), json!({"status": "ARQUIVADO"}), OfficeParams::default())
            .await
            .unwrap();
        assert!(svc.find(&ana(), OfficeParams::default()).await.unwrap().is_empty());

        let mut archived = OfficeParams::default();
        archived.query.insert("archived".into(), "true".into());
        let listed = svc.find(&ana(), archived).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["client_name"], "Maria Souza");

        svc.patch(&ana(), Some(id), json!({"status": "ANDAMENTO"}), OfficeParams::default())
            .await
            .unwrap();
        assert_eq!(svc.find(&ana(), OfficeParams::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn patch_only_changes_status() {
        let (svc, client_id) = seeded().await;
        let created = svc
            .create(&ana(), case("0001", &client_id), OfficeParams::default())
            .await
            .unwrap();
        let err = svc
            .patch(
                &ana(),
                created["id"].as_str(),
                json!({"status": "CONCLUIDO", "number": "9999"}),
                OfficeParams::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(CausaError::from_anyhow(&err).unwrap().kind, ErrorKind::Unprocessable);
    }

    #[tokio::test]
    async fn search_covers_number_client_and_description() {
        let (svc, client_id) = seeded().await;
        svc.create(&ana(), case("5001234-11", &client_id), OfficeParams::default())
            .await
            .unwrap();

        for q in ["5001234", "maria", "COBRANÇA"] {
            let mut params = OfficeParams::default();
            params.query.insert("q".into(), q.into());
            assert_eq!(svc.find(&ana(), params).await.unwrap().len(), 1, "q={q}");
        }

        let mut params = OfficeParams::default();
        params.query.insert("area".into(), "criminal".into());
        assert!(svc.find(&ana(), params).await.unwrap().is_empty());
    }
}
