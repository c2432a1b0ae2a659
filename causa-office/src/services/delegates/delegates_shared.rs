use std::sync::Arc;

use causa_auth::{Capability, HashPasswordHook, PermissionGate, RequireCapability, RequireOwner};
use causa_core::{CausaApp, ServiceMethodKind, ServiceMethods};
use serde_json::Value;

use crate::services::OfficeParams;

use super::delegates_hooks::ValidateDelegatePassword;

pub fn crud_methods() -> ServiceMethods {
    ServiceMethods::standard_crud()
}

/// Reading the team needs `gerenciar_colaboradores`; every change to a
/// delegate account is the owner's alone.
pub fn register_hooks(app: &CausaApp<Value, OfficeParams>, gate: &PermissionGate) -> anyhow::Result<()> {
    let manage = Arc::new(RequireCapability::new(gate.clone(), Capability::GerenciarColaboradores));
    let owner_only = |action: &str| Arc::new(RequireOwner::new(gate.clone(), action));
    let hash = Arc::new(HashPasswordHook::new());

    app.service("delegates")?.hooks(|h| {
        h.before_find(manage.clone());
        h.before_get(manage.clone());

        h.before_create(owner_only("create_delegate"));
        h.before(ServiceMethodKind::Update, owner_only("update_delegate"));
        h.before_patch(owner_only("update_delegate"));
        h.before_remove(owner_only("remove_delegate"));

        h.before_create(Arc::new(ValidateDelegatePassword::required()));
        h.before_patch(Arc::new(ValidateDelegatePassword::optional()));
        h.before(ServiceMethodKind::Update, Arc::new(ValidateDelegatePassword::optional()));
        for method in [ServiceMethodKind::Create, ServiceMethodKind::Update, ServiceMethodKind::Patch] {
            h.before(method, hash.clone());
        }
    });
    Ok(())
}
