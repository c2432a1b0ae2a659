mod app;
mod dashboard;
mod hooks;
pub mod services;
pub mod utils;

use std::sync::Arc;

use anyhow::Result;
use causa_auth::{IdentityResolver, IdentityStore, MemoryIdentityStore, PermissionGate};
use causa_axum::{axum, AxumApp};
use serde_json::Value;

use crate::services::{OfficeParams, OfficeState};

/// The office app over a fresh identity store.
pub fn build() -> Result<AxumApp<Value, OfficeParams>> {
    build_with(Arc::new(MemoryIdentityStore::new()))
}

/// The office app over `store`, which the resolver, the gate and the
/// delegate services all share.
pub fn build_with(store: Arc<MemoryIdentityStore>) -> Result<AxumApp<Value, OfficeParams>> {
    let app = app::office_app();
    let identities: Arc<dyn IdentityStore> = store.clone();
    let gate = PermissionGate::from_config(Arc::clone(&identities), &app.config_snapshot());
    let resolver = IdentityResolver::new(identities);

    hooks::global_hooks(&app);
    services::configure(&app, Arc::new(OfficeState::default()), store, &gate)?;

    let mut ax = axum(app, resolver);
    for path in services::PATHS {
        ax = ax.expose_service(path);
    }
    Ok(ax.use_get("/dashboard", dashboard::dashboard))
}
