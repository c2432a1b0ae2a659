use std::sync::Arc;

use causa_auth::{Capability, PermissionGate, RequireCapability};
use causa_core::{CausaApp, ServiceMethodKind, ServiceMethods};
use serde_json::Value;

use crate::services::references::RequireReference;
use crate::services::OfficeParams;

use super::case_progress_schema::ERROR_MESSAGE;

pub fn crud_methods() -> ServiceMethods {
    ServiceMethods::standard_crud()
}

/// Progress entries are part of the case: reading them needs case read
/// access, any change needs case edit access.
pub fn register_hooks(app: &CausaApp<Value, OfficeParams>, gate: &PermissionGate) -> anyhow::Result<()> {
    let require = |capability| Arc::new(RequireCapability::new(gate.clone(), capability));
    let case_exists = Arc::new(RequireReference::new("case_id", "cases", ERROR_MESSAGE));

    app.service("case-progress")?.hooks(|h| {
        h.before_find(require(Capability::VisualizarProcesso));
        h.before_get(require(Capability::VisualizarProcesso));
        h.before_create(require(Capability::EditarProcesso));
        h.before(ServiceMethodKind::Update, require(Capability::EditarProcesso));
        h.before_patch(require(Capability::EditarProcesso));
        h.before_remove(require(Capability::EditarProcesso));

        h.before_create(case_exists.clone());
        h.before(ServiceMethodKind::Update, case_exists.clone());
        h.before_patch(case_exists.clone());
    });
    Ok(())
}
