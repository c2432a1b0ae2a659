use std::sync::Arc;

use anyhow::Result;
use causa_core::tenant::TenantContext;
use serde_json::Value;
use tracing::debug;

use crate::services::adapters::office_adapter::str_field;
use crate::services::adapters::{OfficeAdapter, StoreKind};
use crate::services::types::OfficeState;

/// Removes the records that cannot outlive their parent.
///
/// Client → cases and direct appointments; case → progress entries, fees
/// and appointments; appointment → reschedule log.
#[derive(Clone)]
pub struct Cascade {
    state: Arc<OfficeState>,
}

fn refers_to<'a>(field: &'static str, id: &'a str) -> impl Fn(&Value) -> bool + 'a {
    move |v: &Value| str_field(v, field) == Some(id)
}

impl Cascade {
    pub fn new(state: Arc<OfficeState>) -> Self {
        Self { state }
    }

    fn table(&self, store: StoreKind) -> OfficeAdapter {
        OfficeAdapter::new(Arc::clone(&self.state), store)
    }

    pub async fn appointment_removed(&self, ctx: &TenantContext, appointment_id: &str) -> Result<()> {
        let logs = self
            .table(StoreKind::Reschedules)
            ._remove_where(ctx, refers_to("appointment_id", appointment_id))
            .await?;
        debug!(appointment_id, logs = logs.len(), "appointment dependents removed");
        Ok(())
    }

    async fn appointments_removed(&self, ctx: &TenantContext, removed: Vec<Value>) -> Result<()> {
        for appointment in removed {
            if let Some(id) = str_field(&appointment, "id") {
                self.appointment_removed(ctx, id).await?;
            }
        }
        Ok(())
    }

    pub async fn case_removed(&self, ctx: &TenantContext, case_id: &str) -> Result<()> {
        self.table(StoreKind::CaseProgress)
            ._remove_where(ctx, refers_to("case_id", case_id))
            .await?;
        self.table(StoreKind::Fees)
            ._remove_where(ctx, refers_to("case_id", case_id))
            .await?;
        let appointments = self
            .table(StoreKind::Appointments)
            ._remove_where(ctx, refers_to("case_id", case_id))
            .await?;
        debug!(case_id, appointments = appointments.len(), "case dependents removed");
        self.appointments_removed(ctx, appointments).await
    }

    pub async fn client_removed(&self, ctx: &TenantContext, client_id: &str) -> Result<()> {
        let cases = self
            .table(StoreKind::Cases)
            ._remove_where(ctx, refers_to("client_id", client_id))
            .await?;
        for case in &cases {
            if let Some(id) = str_field(case, "id") {
                self.case_removed(ctx, id).await?;
            }
        }

        let appointments = self
            .table(StoreKind::Appointments)
            ._remove_where(ctx, refers_to("client_id", client_id))
            .await?;
        debug!(client_id, cases = cases.len(), "client dependents removed");
        self.appointments_removed(ctx, appointments).await
    }
}
