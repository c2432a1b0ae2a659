use causa_core::config::ENV_PREFIX;
use causa_core::CausaApp;
use serde_json::Value;
use tracing::debug;

use crate::services::OfficeParams;

/// Core app with office defaults; `CAUSA__*` environment variables win.
pub fn office_app() -> CausaApp<Value, OfficeParams> {
    let app: CausaApp<Value, OfficeParams> = CausaApp::new();
    app.set_default("http.host", "127.0.0.1");
    app.set_default("http.port", "3030");
    app.set_default("auth.fallback_route", "/dashboard");
    app.set_default("auth.session_header", "x-causa-user");
    app.set_default("dashboard.limit", "10");

    let loaded = app.load_env(ENV_PREFIX, std::env::vars());
    debug!(loaded, "configuration loaded");
    app
}
