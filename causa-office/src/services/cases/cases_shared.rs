use std::sync::Arc;

use causa_auth::{Capability, PermissionGate, RequireCapability};
use causa_core::{CausaApp, ServiceMethodKind, ServiceMethods};
use serde_json::Value;

use crate::services::references::RequireReference;
use crate::services::OfficeParams;

use super::cases_schema::ERROR_MESSAGE;

pub fn crud_methods() -> ServiceMethods {
    ServiceMethods::standard_crud()
}

pub fn register_hooks(app: &CausaApp<Value, OfficeParams>, gate: &PermissionGate) -> anyhow::Result<()> {
    let require = |capability| Arc::new(RequireCapability::new(gate.clone(), capability));
    let client_exists = Arc::new(RequireReference::new("client_id", "clients", ERROR_MESSAGE));

    app.service("cases")?.hooks(|h| {
        h.before_find(require(Capability::ListarProcessos));
        h.before_get(require(Capability::VisualizarProcesso));
        h.before_create(require(Capability::CadastrarProcesso));
        h.before(ServiceMethodKind::Update, require(Capability::EditarProcesso));
        h.before_patch(require(Capability::AtualizarStatusProcesso));
        h.before_remove(require(Capability::ExcluirProcesso));

        h.before_create(client_exists.clone());
        h.before(ServiceMethodKind::Update, client_exists.clone());
    });
    Ok(())
}
