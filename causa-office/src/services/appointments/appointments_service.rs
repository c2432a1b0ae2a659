use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use causa_core::errors::CausaError;
use causa_core::tenant::TenantContext;
use causa_core::{CausaService, ServiceMethods};
use serde_json::Value;

use crate::services::adapters::office_adapter::{merge_patch, sort_asc_by, sort_desc_by, str_field};
use crate::services::adapters::{OfficeAdapter, StoreKind};
use crate::services::cascade::Cascade;
use crate::services::{OfficeParams, OfficeState};
use crate::utils::clock::now_ts;
use crate::utils::validator::validate;

use super::appointments_schema::{AppointmentInput, ERROR_MESSAGE};
use super::appointments_shared;

/// Builds the calendar label of an appointment from the owner's cases and
/// clients.
pub struct Labeler {
    cases: HashMap<String, Value>,
    client_names: HashMap<String, String>,
}

impl Labeler {
    pub async fn load(state: &Arc<OfficeState>, ctx: &TenantContext) -> Result<Self> {
        let index = |records: Vec<Value>| -> HashMap<String, Value> {
            records
                .into_iter()
                .filter_map(|r| Some((str_field(&r, "id")?.to_string(), r)))
                .collect()
        };
        let cases = index(OfficeAdapter::new(Arc::clone(state), StoreKind::Cases)._find(ctx).await?);
        let client_names = index(OfficeAdapter::new(Arc::clone(state), StoreKind::Clients)._find(ctx).await?)
            .into_iter()
            .filter_map(|(id, c)| Some((id, str_field(&c, "name")?.to_string())))
            .collect();
        Ok(Self { cases, client_names })
    }

    fn client_name(&self, id: Option<&str>) -> &str {
        id.and_then(|id| self.client_names.get(id))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// `Proc: <number> - <client>` for case appointments, `Cliente: <client>`
    /// otherwise.
    pub fn title(&self, appointment: &Value) -> String {
        if let Some(case) = str_field(appointment, "case_id").and_then(|id| self.cases.get(id)) {
            let number = str_field(case, "number").unwrap_or_default();
            let client = self.client_name(str_field(case, "client_id"));
            return format!("Proc: {number} - {client}");
        }
        format!("Cliente: {}", self.client_name(str_field(appointment, "client_id")))
    }

    pub fn labeled(&self, mut appointment: Value) -> Value {
        let title = self.title(&appointment);
        if let Some(obj) = appointment.as_object_mut() {
            obj.insert("title".to_string(), Value::String(title));
        }
        appointment
    }
}

pub struct AppointmentsService {
    pub adapter: OfficeAdapter,
    state: Arc<OfficeState>,
    cascade: Cascade,
}

impl AppointmentsService {
    pub fn new(state: Arc<OfficeState>) -> Self {
        Self {
            adapter: OfficeAdapter::new(Arc::clone(&state), StoreKind::Appointments),
            cascade: Cascade::new(Arc::clone(&state)),
            state,
        }
    }
}

fn parse(data: &Value) -> Result<Value> {
    let input = validate::<AppointmentInput>(data, ERROR_MESSAGE)?.normalized()?;
    let mut value = serde_json::to_value(&input)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("updated_at".to_string(), Value::String(now_ts()));
    }
    Ok(value)
}

/// One appointment per case (or per client) at any instant.
pub fn ensure_free_slot(
    peers: &HashMap<String, Value>,
    appointment: &Value,
    except: Option<&str>,
) -> Result<()> {
    let starts_at = str_field(appointment, "starts_at");
    let owner_of = |v: &Value| {
        str_field(v, "case_id")
            .map(|id| ("case_id", id.to_string()))
            .or_else(|| str_field(v, "client_id").map(|id| ("client_id", id.to_string())))
    };
    let mine = owner_of(appointment);

    let clash = peers
        .values()
        .filter(|v| str_field(v, "id") != except)
        .any(|v| str_field(v, "starts_at") == starts_at && owner_of(v) == mine);
    if clash {
        return Err(CausaError::conflict("There is already an appointment at this time").into_anyhow());
    }
    Ok(())
}

fn keep_created_by(mut value: Value, existing: &Value) -> Value {
    if let (Some(obj), Some(by)) = (value.as_object_mut(), existing.get("created_by")) {
        obj.insert("created_by".to_string(), by.clone());
    }
    value
}

#[async_trait]
impl CausaService<Value, OfficeParams> for AppointmentsService {
    fn methods(&self) -> ServiceMethods {
        appointments_shared::crud_methods()
    }

    /// Newest first; `upcoming=true` lists what is still ahead, earliest
    /// first.
    async fn find(&self, ctx: &TenantContext, params: OfficeParams) -> Result<Vec<Value>> {
        let mut all = self.adapter._find(ctx).await?;
        if params.query_bool("upcoming").unwrap_or(false) {
            let now = now_ts();
            all.retain(|a| str_field(a, "starts_at").map(|s| s >= now.as_str()).unwrap_or(false));
            sort_asc_by(&mut all, "starts_at");
        } else {
            sort_desc_by(&mut all, "starts_at");
        }

        let labeler = Labeler::load(&self.state, ctx).await?;
        Ok(all.into_iter().map(|a| labeler.labeled(a)).collect())
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: OfficeParams) -> Result<Value> {
        let appointment = self.adapter._get(ctx, id).await?;
        Ok(Labeler::load(&self.state, ctx).await?.labeled(appointment))
    }

    async fn create(&self, ctx: &TenantContext, data: Value, _params: OfficeParams) -> Result<Value> {
        let mut value = parse(&data)?;
        if let Some(obj) = value.as_object_mut() {
            let by = ctx.actor().map(|a| Value::String(a.to_string())).unwrap_or(Value::Null);
            obj.insert("created_by".to_string(), by);
        }
        let check = value.clone();
        self.adapter
            ._create_checked(ctx, value, |peers| ensure_free_slot(peers, &check, None))
            .await
    }

    async fn update(&self, ctx: &TenantContext, id: &str, data: Value, _params: OfficeParams) -> Result<Value> {
        let value = parse(&data)?;
        self.adapter
            ._modify(ctx, id, |existing, peers| {
                ensure_free_slot(peers, &value, Some(id))?;
                Ok(keep_created_by(value, existing))
            })
            .await
    }

    async fn patch(&self, ctx: &TenantContext, id: Option<&str>, data: Value, _params: OfficeParams) -> Result<Value> {
        let id = self.adapter.require_id(id, "Patch requires an id")?;
        self.adapter
            ._modify(ctx, id, |existing, peers| {
                let value = parse(&merge_patch(existing, &data))?;
                ensure_free_slot(peers, &value, Some(id))?;
                Ok(keep_created_by(value, existing))
            })
            .await
    }

    async fn remove(&self, ctx: &TenantContext, id: Option<&str>, _params: OfficeParams) -> Result<Value> {
        let removed = self.adapter._remove(ctx, id).await?;
        if let Some(id) = str_field(&removed, "id") {
            self.cascade.appointment_removed(ctx, id).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causa_core::ErrorKind;
    use serde_json::json;

    fn ana() -> TenantContext {
        TenantContext::new("ana").with_actor("bia")
    }

    fn at(starts_at: &str) -> Value {
        json!({"client_id": "client:1", "starts_at": starts_at, "kind": "atendimento"})
    }

    #[tokio::test]
    async fn same_instant_clashes_across_offsets() {
        let svc = AppointmentsService::new(Arc::new(OfficeState::default()));
        let created = svc
            .create(&ana(), at("2030-03-10T14:00:00-03:00"), OfficeParams::default())
            .await
            .unwrap();
        assert_eq!(created["created_by"], "bia");

        let err = svc
            .create(&ana(), at("2030-03-10T17:00:00Z"), OfficeParams::default())
            .await
            .unwrap_err();
        assert_eq!(CausaError::from_anyhow(&err).unwrap().kind, ErrorKind::Conflict);

        // a different client may use the slot
        let other = json!({"client_id": "client:2", "starts_at": "2030-03-10T17:00:00Z", "kind": "reuniao"});
        assert!(svc.create(&ana(), other, OfficeParams::default()).await.is_ok());
    }

    #[tokio::test]
    async fn upcoming_lists_future_appointments_earliest_first() {
        let svc = AppointmentsService::new(Arc::new(OfficeState::default()));
        for when in ["2001-01-01T10:00:00Z", "2099-05-01T10:00:00Z", "2098-05-01T10:00:00Z"] {
            svc.create(&ana(), at(when), OfficeParams::default()).await.unwrap();
        }

        let mut params = OfficeParams::default();
        params.query.insert("upcoming".into(), "true".into());
        let upcoming = svc.find(&ana(), params).await.unwrap();
        assert_eq!(upcoming.len(), 2);
        assert!(upcoming[0]["starts_at"].as_str().unwrap().starts_with("2098"));

        let all = svc.find(&ana(), OfficeParams::default()).await.unwrap();
        assert!(all[0]["starts_at"].as_str().unwrap().starts_with("2099"));
        assert_eq!(all[0]["title"], "Cliente: ");
    }
}
