use std::sync::Arc;

use causa_auth::{Capability, PermissionGate, RequireCapability, RequireOwner};
use causa_core::{CausaApp, ServiceMethodKind, ServiceMethods};
use serde_json::Value;

use crate::services::OfficeParams;

pub fn flag_methods() -> ServiceMethods {
    ServiceMethods::from_methods(vec![
        ServiceMethodKind::Find,
        ServiceMethodKind::Get,
        ServiceMethodKind::Patch,
    ])
}

pub fn register_hooks(app: &CausaApp<Value, OfficeParams>, gate: &PermissionGate) -> anyhow::Result<()> {
    let manage = Arc::new(RequireCapability::new(gate.clone(), Capability::GerenciarColaboradores));

    app.service("capabilities")?.hooks(|h| {
        h.before_find(manage.clone());
        h.before_get(manage.clone());
        h.before_patch(Arc::new(RequireOwner::new(gate.clone(), "update_capabilities")));
    });
    Ok(())
}
