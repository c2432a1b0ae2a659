use std::sync::Arc;

use causa_auth::{Capability, PermissionGate, RequireCapability};
use causa_core::{CausaApp, ServiceMethodKind, ServiceMethods};
use serde_json::Value;

use crate::services::references::RequireReference;
use crate::services::OfficeParams;

use super::appointments_schema::ERROR_MESSAGE;

pub fn crud_methods() -> ServiceMethods {
    ServiceMethods::standard_crud()
}

pub fn register_hooks(app: &CausaApp<Value, OfficeParams>, gate: &PermissionGate) -> anyhow::Result<()> {
    let require = |capability| Arc::new(RequireCapability::new(gate.clone(), capability));
    let case_exists = Arc::new(RequireReference::new("case_id", "cases", ERROR_MESSAGE));
    let client_exists = Arc::new(RequireReference::new("client_id", "clients", ERROR_MESSAGE));

    app.service("appointments")?.hooks(|h| {
        h.before_find(require(Capability::VerAgenda));
        h.before_get(require(Capability::VerAgenda));
        h.before_create(require(Capability::AdicionarEvento));
        h.before(ServiceMethodKind::Update, require(Capability::EditarEvento));
        h.before_patch(require(Capability::EditarEvento));
        h.before_remove(require(Capability::EditarEvento));

        for method in [ServiceMethodKind::Create, ServiceMethodKind::Update, ServiceMethodKind::Patch] {
            h.before(method, case_exists.clone());
            h.before(method, client_exists.clone());
        }
    });
    Ok(())
}
