use std::sync::Arc;

use causa_auth::{PermissionGate, RequireSession};
use causa_core::{CausaApp, ServiceMethodKind, ServiceMethods};
use serde_json::Value;

use crate::services::OfficeParams;

/// `PATCH /notifications/all` marks every notification read.
pub const ALL: &str = "all";

pub fn inbox_methods() -> ServiceMethods {
    ServiceMethods::from_methods(vec![
        ServiceMethodKind::Find,
        ServiceMethodKind::Get,
        ServiceMethodKind::Patch,
    ])
}

pub fn register_hooks(app: &CausaApp<Value, OfficeParams>, gate: &PermissionGate) -> anyhow::Result<()> {
    app.service("notifications")?.hooks(|h| {
        h.before_all(Arc::new(RequireSession::new(gate.clone())));
    });
    Ok(())
}
