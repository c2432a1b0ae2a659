use std::sync::Arc;

use causa_auth::{Capability, PermissionGate, RequireCapability};
use causa_core::{CausaApp, ServiceMethodKind, ServiceMethods};
use serde_json::Value;

use crate::services::references::RequireReference;
use crate::services::OfficeParams;

use super::reschedules_schema::ERROR_MESSAGE;

/// The log is append-only.
pub fn log_methods() -> ServiceMethods {
    ServiceMethods::from_methods(vec![
        ServiceMethodKind::Find,
        ServiceMethodKind::Get,
        ServiceMethodKind::Create,
    ])
}

pub fn register_hooks(app: &CausaApp<Value, OfficeParams>, gate: &PermissionGate) -> anyhow::Result<()> {
    let require = |capability| Arc::new(RequireCapability::new(gate.clone(), capability));

    app.service("reschedules")?.hooks(|h| {
        h.before_find(require(Capability::VerAgenda));
        h.before_get(require(Capability::VerAgenda));
        h.before_create(require(Capability::EditarEvento));
        h.before_create(Arc::new(RequireReference::new(
            "appointment_id",
            "appointments",
            ERROR_MESSAGE,
        )));
    });
    Ok(())
}
