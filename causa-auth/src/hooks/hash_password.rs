use anyhow::Result;
use async_trait::async_trait;
use causa_core::{CausaBeforeHook, CausaError, HookContext};
use serde_json::Value;

use crate::password::{hash_password, DEFAULT_COST};

pub const BCRYPT_COST_KEY: &str = "auth.bcrypt_cost";

/// Replace a plain `password` in the payload with its bcrypt hash.
///
/// The plain field is removed; the hash is stored under `hashed_field`
/// (default `password_hash`). A `hashed_field` sent by the client is always
/// dropped, so the only way to set a hash is through a plain password.
pub struct HashPasswordHook {
    field: String,
    hashed_field: String,
}

impl HashPasswordHook {
    pub fn new() -> Self {
        Self {
            field: "password".to_string(),
            hashed_field: "password_hash".to_string(),
        }
    }

    pub fn fields(field: impl Into<String>, hashed_field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            hashed_field: hashed_field.into(),
        }
    }
}

impl Default for HashPasswordHook {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<P> CausaBeforeHook<Value, P> for HashPasswordHook
where
    P: Send + Sync + Clone + 'static,
{
    async fn run(&self, ctx: &mut HookContext<Value, P>) -> Result<()> {
        let cost = ctx.config.get_u32(BCRYPT_COST_KEY).unwrap_or(DEFAULT_COST);

        let Some(Value::Object(obj)) = ctx.data.as_mut() else {
            return Ok(());
        };
        obj.remove(&self.hashed_field);
        let Some(plain) = obj.remove(&self.field) else {
            return Ok(());
        };
        let plain = plain.as_str().ok_or_else(|| {
            CausaError::bad_request(format!("'{}' must be a string", self.field)).into_anyhow()
        })?;

        let hashed = hash_password(plain, cost).map_err(|e| e.into_anyhow())?;
        obj.insert(self.hashed_field.clone(), Value::String(hashed));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::verify_password;
    use causa_core::{CausaApp, CausaService, TenantContext};
    use serde_json::json;
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl CausaService<Value, ()> for Echo {
        async fn create(&self, _ctx: &TenantContext, data: Value, _p: ()) -> Result<Value> {
            Ok(data)
        }
    }

    #[tokio::test]
    async fn plain_password_is_replaced_by_hash() {
        let app: CausaApp<Value, ()> = CausaApp::new();
        app.set(BCRYPT_COST_KEY, "4");
        app.register_service("delegates", Arc::new(Echo));
        app.service("delegates").unwrap().hooks(|h| {
            h.before_create(Arc::new(HashPasswordHook::new()));
        });

        let out = app
            .service("delegates")
            .unwrap()
            .create(
                TenantContext::new("ana"),
                json!({"username": "bia", "password": "s3cret!"}),
                (),
            )
            .await
            .unwrap();

        assert!(out.get("password").is_none());
        let hash = out["password_hash"].as_str().unwrap();
        assert!(verify_password("s3cret!", hash));
    }

    #[tokio::test]
    async fn client_supplied_hash_is_dropped() {
        let app: CausaApp<Value, ()> = CausaApp::new();
        app.register_service("delegates", Arc::new(Echo));
        app.service("delegates").unwrap().hooks(|h| {
            h.before_create(Arc::new(HashPasswordHook::new()));
        });

        let out = app
            .service("delegates")
            .unwrap()
            .create(
                TenantContext::new("ana"),
                json!({"username": "bia", "password_hash": "x"}),
                (),
            )
            .await
            .unwrap();

        assert!(out.get("password_hash").is_none());
        assert_eq!(out["username"], "bia");
    }
}
