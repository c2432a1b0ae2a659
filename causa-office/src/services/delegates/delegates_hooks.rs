use anyhow::Result;
use async_trait::async_trait;
use causa_core::hooks::{CausaBeforeHook, HookContext};
use serde_json::Value;

use crate::services::OfficeParams;
use crate::utils::validator::field_error;

use super::delegates_schema::ERROR_MESSAGE;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Check the plain password before it is hashed away.
pub struct ValidateDelegatePassword {
    required: bool,
}

impl ValidateDelegatePassword {
    pub fn required() -> Self {
        Self { required: true }
    }

    pub fn optional() -> Self {
        Self { required: false }
    }
}

#[async_trait]
impl CausaBeforeHook<Value, OfficeParams> for ValidateDelegatePassword {
    async fn run(&self, ctx: &mut HookContext<Value, OfficeParams>) -> Result<()> {
        match ctx.data.as_ref().and_then(|d| d.get("password")) {
            None | Some(Value::Null) if !self.required => Ok(()),
            None | Some(Value::Null) => Err(field_error(ERROR_MESSAGE, "password", "is required")),
            Some(Value::String(p)) if p.chars().count() >= MIN_PASSWORD_LEN => Ok(()),
            Some(_) => Err(field_error(
                ERROR_MESSAGE,
                "password",
                format!("must be a string of at least {MIN_PASSWORD_LEN} characters"),
            )),
        }
    }
}
