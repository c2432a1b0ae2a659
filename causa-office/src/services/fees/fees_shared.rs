use std::sync::Arc;

use causa_auth::{Capability, PermissionGate, RequireCapability};
use causa_core::{CausaApp, ServiceMethodKind, ServiceMethods};
use serde_json::Value;

use crate::services::references::RequireReference;
use crate::services::OfficeParams;

use super::fees_schema::ERROR_MESSAGE;

pub fn crud_methods() -> ServiceMethods {
    ServiceMethods::standard_crud()
}

pub fn register_hooks(app: &CausaApp<Value, OfficeParams>, gate: &PermissionGate) -> anyhow::Result<()> {
    let finance = Arc::new(RequireCapability::new(gate.clone(), Capability::AcessarFinanceiro));
    let case_exists = Arc::new(RequireReference::new("case_id", "cases", ERROR_MESSAGE));

    app.service("fees")?.hooks(|h| {
        h.before_all(finance);
        for method in [ServiceMethodKind::Create, ServiceMethodKind::Update, ServiceMethodKind::Patch] {
            h.before(method, case_exists.clone());
        }
    });
    Ok(())
}
