use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use causa_auth::{AuthError, DelegateChanges, DelegateId, DelegateRecord, MemoryIdentityStore, OwnerId, UserId};
use causa_core::errors::CausaError;
use causa_core::tenant::TenantContext;
use causa_core::{CausaService, ServiceMethods};
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::services::adapters::office_adapter::merge_patch;
use crate::services::OfficeParams;
use crate::utils::validator::validate;

use super::delegates_schema::{CreateDelegate, UpdateDelegate, ERROR_MESSAGE};
use super::delegates_shared;

/// Delegate accounts of the calling owner, backed by the identity store
/// the resolver and gate read from.
pub struct DelegatesService {
    store: Arc<MemoryIdentityStore>,
}

impl DelegatesService {
    pub fn new(store: Arc<MemoryIdentityStore>) -> Self {
        Self { store }
    }
}

fn owner_of(ctx: &TenantContext) -> Result<OwnerId> {
    if ctx.is_anonymous() {
        return Err(CausaError::not_authenticated("Authentication required").into_anyhow());
    }
    Ok(OwnerId::new(ctx.tenant_id.as_str()))
}

/// Public view of a delegate: the record plus its login name, never
/// credentials.
fn to_json(record: &DelegateRecord) -> Result<Value> {
    let mut value = serde_json::to_value(record)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("username".to_string(), Value::String(record.user.to_string()));
    }
    Ok(value)
}

fn changes_from(input: &UpdateDelegate) -> DelegateChanges {
    DelegateChanges {
        name: input.name.trim().to_string(),
        email: input.email.trim().to_string(),
        phone: input.phone.trim().to_string(),
        role: input.role,
        active: input.active,
    }
}

#[async_trait]
impl CausaService<Value, OfficeParams> for DelegatesService {
    fn methods(&self) -> ServiceMethods {
        delegates_shared::crud_methods()
    }

    async fn find(&self, ctx: &TenantContext, _params: OfficeParams) -> Result<Vec<Value>> {
        let owner = owner_of(ctx)?;
        self.store
            .list_delegates(&owner)
            .await
            .iter()
            .map(to_json)
            .collect()
    }

    async fn get(&self, ctx: &TenantContext, id: &str, _params: OfficeParams) -> Result<Value> {
        let owner = owner_of(ctx)?;
        let record = self
            .store
            .get_delegate(&owner, &DelegateId::new(id))
            .await
            .map_err(AuthError::into_anyhow)?;
        to_json(&record)
    }

    /// Create the delegate, its login and its default capability set.
    async fn create(&self, ctx: &TenantContext, data: Value, _params: OfficeParams) -> Result<Value> {
        let owner = owner_of(ctx)?;
        let input = validate::<CreateDelegate>(&data, ERROR_MESSAGE)?;

        let record = DelegateRecord {
            id: DelegateId::new(format!("delegate:{}", Uuid::new_v4())),
            owner,
            user: UserId::new(input.username.trim()),
            name: input.name.trim().to_string(),
            email: input.email.trim().to_string(),
            phone: input.phone.trim().to_string(),
            role: input.role,
            active: true,
            created_at: Utc::now(),
        };
        let record = self
            .store
            .insert_delegate(record, Some(input.password_hash))
            .await
            .map_err(AuthError::into_anyhow)?;
        info!(delegate = %record.id, owner = %record.owner, "delegate created");
        to_json(&record)
    }

    async fn update(&self, ctx: &TenantContext, id: &str, data: Value, _params: OfficeParams) -> Result<Value> {
        let owner = owner_of(ctx)?;
        let input = validate::<UpdateDelegate>(&data, ERROR_MESSAGE)?;
        self.apply(&owner, id, input).await
    }

    /// Partial edit; `{"password": ...}` alone is a password change.
    async fn patch(&self, ctx: &TenantContext, id: Option<&str>, data: Value, _params: OfficeParams) -> Result<Value> {
        let id = id.ok_or_else(|| CausaError::bad_request("Patch requires an id").into_anyhow())?;
        let owner = owner_of(ctx)?;
        let current = self
            .store
            .get_delegate(&owner, &DelegateId::new(id))
            .await
            .map_err(AuthError::into_anyhow)?;

        let mut base = Map::new();
        base.insert("name".into(), Value::String(current.name));
        base.insert("email".into(), Value::String(current.email));
        base.insert("phone".into(), Value::String(current.phone));
        base.insert("role".into(), serde_json::to_value(current.role)?);
        base.insert("active".into(), Value::Bool(current.active));

        let merged = merge_patch(&Value::Object(base), &data);
        let input = validate::<UpdateDelegate>(&merged, ERROR_MESSAGE)?;
        self.apply(&owner, id, input).await
    }

    /// The login stops resolving and the capability set goes with it.
    async fn remove(&self, ctx: &TenantContext, id: Option<&str>, _params: OfficeParams) -> Result<Value> {
        let id = id.ok_or_else(|| CausaError::bad_request("Remove requires an id").into_anyhow())?;
        let owner = owner_of(ctx)?;
        let record = self
            .store
            .remove_delegate(&owner, &DelegateId::new(id))
            .await
            .map_err(AuthError::into_anyhow)?;
        info!(delegate = %record.id, owner = %record.owner, "delegate removed");
        to_json(&record)
    }
}

impl DelegatesService {
    async fn apply(&self, owner: &OwnerId, id: &str, input: UpdateDelegate) -> Result<Value> {
        let id = DelegateId::new(id);
        let record = self
            .store
            .update_delegate(owner, &id, changes_from(&input))
            .await
            .map_err(AuthError::into_anyhow)?;
        if let Some(hash) = input.password_hash {
            self.store.set_password_hash(&record.user, hash).await;
            info!(delegate = %record.id, "delegate password changed");
        }
        to_json(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causa_auth::{IdentityResolver, Session};
    use causa_core::ErrorKind;
    use serde_json::json;

    fn ana() -> TenantContext {
        TenantContext::new("ana").with_actor("ana")
    }

    fn bia() -> Value {
        json!({
            "username": "bia",
            "password_hash": "$2b$04$hash",
            "name": "Bia Lima",
            "email": "bia@office.test",
            "role": "SEC"
        })
    }

    #[tokio::test]
    async fn created_delegates_resolve_to_their_owner() {
        let store = Arc::new(MemoryIdentityStore::new());
        let svc = DelegatesService::new(Arc::clone(&store));
        let created = svc.create(&ana(), bia(), OfficeParams::default()).await.unwrap();
        assert_eq!(created["username"], "bia");
        assert_eq!(created["owner"], "ana");
        assert!(created.get("password_hash").is_none());

        let session = IdentityResolver::new(store).resolve_session(Some("bia")).await;
        assert_eq!(session.principal().unwrap().owner(), OwnerId::new("ana"));
    }

    #[tokio::test]
    async fn removed_delegates_stop_resolving() {
        let store = Arc::new(MemoryIdentityStore::new());
        let svc = DelegatesService::new(Arc::clone(&store));
        let created = svc.create(&ana(), bia(), OfficeParams::default()).await.unwrap();
        svc.remove(&ana(), created["id"].as_str(), OfficeParams::default())
            .await
            .unwrap();

        let session = IdentityResolver::new(store).resolve_session(Some("bia")).await;
        assert_eq!(session, Session::Anonymous);
    }

    #[tokio::test]
    async fn other_owners_cannot_touch_the_delegate() {
        let store = Arc::new(MemoryIdentityStore::new());
        let svc = DelegatesService::new(Arc::clone(&store));
        let created = svc.create(&ana(), bia(), OfficeParams::default()).await.unwrap();
        let caio = TenantContext::new("caio").with_actor("caio");

        let err = svc
            .patch(&caio, created["id"].as_str(), json!({"active": false}), OfficeParams::default())
            .await
            .unwrap_err();
        assert_eq!(CausaError::from_anyhow(&err).unwrap().kind, ErrorKind::NotFound);
        assert!(svc.find(&caio, OfficeParams::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn patch_deactivates_and_changes_password() {
        let store = Arc::new(MemoryIdentityStore::new());
        let svc = DelegatesService::new(Arc::clone(&store));
        let created = svc.create(&ana(), bia(), OfficeParams::default()).await.unwrap();

        let patched = svc
            .patch(
                &ana(),
                created["id"].as_str(),
                json!({"active": false, "password_hash": "new-hash"}),
                OfficeParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(patched["active"], false);
        assert_eq!(patched["name"], "Bia Lima");
        assert_eq!(
            store.password_hash(&UserId::new("bia")).await.as_deref(),
            Some("new-hash")
        );
    }
}
