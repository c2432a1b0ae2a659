use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use causa_core::tenant::TenantContext;
use causa_core::{CausaService, ServiceMethods};
use serde_json::{json, Value};
use tracing::info;

use crate::services::adapters::office_adapter::{sort_desc_by, str_field};
use crate::services::adapters::{OfficeAdapter, StoreKind};
use crate::services::appointments::appointments_service::{ensure_free_slot, Labeler};
use crate::services::{OfficeParams, OfficeState};
use crate::utils::clock::{format_ts, now_ts, parse_instant};
use crate::utils::validator::{field_error, validate};

use super::reschedules_schema::{RescheduleInput, ERROR_MESSAGE};
use super::reschedules_shared;

pub struct ReschedulesService {
    pub adapter: OfficeAdapter,
    appointments: OfficeAdapter,
    notifications: OfficeAdapter,
    state: Arc<OfficeState>,
}

impl ReschedulesService {
    pub fn new(state: Arc<OfficeState>) -> Self {
        Self {
            adapter: OfficeAdapter::new(Arc::clone(&state), StoreKind::Reschedules),
            appointments: OfficeAdapter::new(Arc::clone(&state), StoreKind::Appointments),
            notifications: OfficeAdapter::new(Arc::clone(&state), StoreKind::Notifications),
            state,
        }
    }
}

#[async_trait]
impl CausaService<Value, OfficeParams> for ReschedulesService {
    fn methods(&self) -> ServiceMethods {
        reschedules_shared::log_methods()
    }

    async fn find(&self, ctx: &TenantContext, params: OfficeParams) -> Result<Vec<Value>> {
        let mut all = self.adapter._find(ctx).await?;
        if let Some(appointment_id) = params.query("appointment_id") {
            all.retain(|r| str_field(r, "appointment_id") == Some(appointment_id));
        }
        sort_desc_by(&mut all, "changed_at");
        Ok(all)
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: OfficeParams) -> Result<Value> {
        self.adapter._get(ctx, id).await
    }

    /// Move the appointment, log the change and tell the owner.
    async fn create(&self, ctx: &TenantContext, data: Value, _params: OfficeParams) -> Result<Value> {
        let input = validate::<RescheduleInput>(&data, ERROR_MESSAGE)?;
        let new_start = parse_instant(&input.new_start)
            .map(format_ts)
            .ok_or_else(|| field_error(ERROR_MESSAGE, "new_start", "must be an RFC 3339 date-time"))?;

        let mut previous_start = String::new();
        let moved = self
            .appointments
            ._modify(ctx, &input.appointment_id, |existing, peers| {
                previous_start = str_field(existing, "starts_at").unwrap_or_default().to_string();
                let mut next = existing.clone();
                if let Some(obj) = next.as_object_mut() {
                    obj.insert("starts_at".to_string(), Value::String(new_start.clone()));
                    obj.insert("updated_at".to_string(), Value::String(now_ts()));
                }
                ensure_free_slot(peers, &next, Some(&input.appointment_id))?;
                Ok(next)
            })
            .await?;

        let changed_by = ctx.actor().unwrap_or_default().to_string();
        let log = self
            .adapter
            ._create(
                ctx,
                json!({
                    "appointment_id": &input.appointment_id,
                    "changed_by": &changed_by,
                    "previous_start": &previous_start,
                    "new_start": &new_start,
                    "changed_at": now_ts(),
                    "reason": &input.reason,
                }),
            )
            .await?;

        let owner = ctx.tenant_id.as_str();
        let title = Labeler::load(&self.state, ctx).await?.title(&moved);
        self.notifications
            ._create_for(
                owner,
                json!({
                    "user": owner,
                    "title": "Appointment rescheduled",
                    "message": format!("{title}: moved from {previous_start} to {new_start} by {changed_by}"),
                    "read": false,
                }),
            )
            .await?;
        info!(appointment_id = %input.appointment_id, %changed_by, "appointment rescheduled");

        Ok(log)
    }
}
