//! `GET /dashboard`: the landing page every denial redirects to.
//!
//! Any authenticated caller may open it, so it reads the services directly
//! instead of through their permission hooks.

use axum::extract::State;
use axum::Json;
use causa_axum::{Caller, CausaAxumError, CausaAxumState};
use causa_core::errors::CausaError;
use serde_json::{json, Value};
use tracing::debug;

use crate::services::OfficeParams;

pub const LIMIT_KEY: &str = "dashboard.limit";
const DEFAULT_LIMIT: usize = 10;

type OfficeAxumState = CausaAxumState<Value, OfficeParams>;

pub async fn dashboard(State(state): State<OfficeAxumState>, caller: Caller) -> Result<Json<Value>, CausaAxumError> {
    if caller.tenant.is_anonymous() {
        return Err(CausaError::not_authenticated("Authentication required").into_anyhow().into());
    }
    let limit = state
        .app
        .config_snapshot()
        .get_usize(LIMIT_KEY)
        .unwrap_or(DEFAULT_LIMIT);

    // the default listing already leaves archived cases out
    let cases = state.app.service("cases")?;
    let mut recent = cases.inner().find(&caller.tenant, OfficeParams::default()).await?;
    recent.truncate(limit);

    let mut upcoming_params = OfficeParams::default();
    upcoming_params.query.insert("upcoming".into(), "true".into());
    let appointments = state.app.service("appointments")?;
    let mut upcoming = appointments.inner().find(&caller.tenant, upcoming_params).await?;
    upcoming.truncate(limit);

    debug!(
        tenant = %caller.tenant.tenant_id.as_str(),
        cases = recent.len(),
        appointments = upcoming.len(),
        "dashboard"
    );
    Ok(Json(json!({
        "owner": caller.tenant.tenant_id.as_str(),
        "user": caller.tenant.actor(),
        "recent_cases": recent,
        "upcoming_appointments": upcoming,
    })))
}
