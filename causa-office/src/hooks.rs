use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use causa_core::errors::CausaError;
use causa_core::hooks::{CausaAfterHook, CausaAroundHook, HookContext, Next};
use causa_core::CausaApp;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::services::OfficeParams;

/// Traces every service call with the caller's partition.
pub struct LogAround;

#[async_trait]
impl CausaAroundHook<Value, OfficeParams> for LogAround {
    async fn run(&self, ctx: &mut HookContext<Value, OfficeParams>, next: Next<Value, OfficeParams>) -> Result<()> {
        debug!(
            method = %ctx.params.method,
            path = %ctx.params.path,
            call = ctx.method.as_str(),
            tenant = %ctx.tenant.tenant_id.as_str(),
            actor = ctx.tenant.actor().unwrap_or("-"),
            "service call"
        );

        let res = next.run(ctx).await;
        if let Err(err) = &res {
            match CausaError::from_anyhow(err) {
                // denials are expected traffic
                Some(e) if e.redirect.is_some() => info!(path = %ctx.params.path, error = %e, "call denied"),
                _ => warn!(path = %ctx.params.path, error = %err, "call failed"),
            }
        }
        res
    }
}

pub struct LogAfter;

#[async_trait]
impl CausaAfterHook<Value, OfficeParams> for LogAfter {
    async fn run(&self, ctx: &mut HookContext<Value, OfficeParams>) -> Result<()> {
        debug!(path = %ctx.params.path, call = ctx.method.as_str(), "service call ok");
        Ok(())
    }
}

pub fn global_hooks(app: &CausaApp<Value, OfficeParams>) {
    app.hooks(|h| {
        h.around_all(Arc::new(LogAround));
        h.after_all(Arc::new(LogAfter));
    });
}
