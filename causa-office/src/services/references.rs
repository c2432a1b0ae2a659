use anyhow::Result;
use async_trait::async_trait;
use causa_core::hooks::{CausaBeforeHook, HookContext};
use serde_json::Value;

use crate::services::OfficeParams;
use crate::utils::validator::field_error;

/// Reject payloads whose `field` names a record that does not exist in the
/// caller's partition of `service`.
///
/// An absent or null field passes; whether it is required is the schema's
/// business.
pub struct RequireReference {
    field: &'static str,
    service: &'static str,
    error_message: &'static str,
}

impl RequireReference {
    pub fn new(field: &'static str, service: &'static str, error_message: &'static str) -> Self {
        Self {
            field,
            service,
            error_message,
        }
    }
}

#[async_trait]
impl CausaBeforeHook<Value, OfficeParams> for RequireReference {
    async fn run(&self, ctx: &mut HookContext<Value, OfficeParams>) -> Result<()> {
        let Some(value) = ctx.data.as_ref().and_then(|d| d.get(self.field)) else {
            return Ok(());
        };
        if value.is_null() {
            return Ok(());
        }
        let Some(id) = value.as_str().map(str::trim).filter(|s| !s.is_empty()) else {
            return Err(field_error(self.error_message, self.field, "must be a non-empty string"));
        };

        let target = ctx.services.service(self.service)?;
        if target.get(&ctx.tenant, id, ctx.params.clone()).await.is_err() {
            return Err(field_error(self.error_message, self.field, "not found"));
        }
        Ok(())
    }
}
