use std::sync::Arc;

use causa_auth::{Capability, PermissionGate, RequireCapability};
use causa_core::{CausaApp, ServiceMethodKind, ServiceMethods};
use serde_json::Value;

use crate::services::OfficeParams;

pub fn crud_methods() -> ServiceMethods {
    ServiceMethods::standard_crud()
}

pub fn register_hooks(app: &CausaApp<Value, OfficeParams>, gate: &PermissionGate) -> anyhow::Result<()> {
    let require = |capability| Arc::new(RequireCapability::new(gate.clone(), capability));

    app.service("clients")?.hooks(|h| {
        h.before_find(require(Capability::ListarClientes));
        h.before_get(require(Capability::VisualizarCliente));
        h.before_create(require(Capability::CadastrarCliente));
        h.before(ServiceMethodKind::Update, require(Capability::EditarCliente));
        h.before_patch(require(Capability::EditarCliente));
        h.before_remove(require(Capability::ExcluirCliente));
    });
    Ok(())
}
