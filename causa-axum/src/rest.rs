use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::rejection::JsonRejection,
    extract::{OriginalUri, Path, Query, State},
    http::{HeaderMap, Uri},
    routing::MethodRouter,
    Json, Router,
};
use causa_auth::{DEFAULT_FALLBACK_ROUTE, FALLBACK_ROUTE_KEY};
use causa_core::errors::CausaError;
use causa_core::{ServiceMethodKind, ServiceMethods, TenantContext};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::{
    params::{FromRestParams, RestParams},
    session::{Caller, DEFAULT_SESSION_HEADER, SESSION_HEADER_KEY},
    CausaAxumError, CausaAxumState,
};

type QueryMap = Query<HashMap<String, String>>;

fn map_json_rejection(rejection: JsonRejection) -> CausaAxumError {
    CausaError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.to_string()]}))
        .into_anyhow()
        .into()
}

/// Unwrap a JSON body once the caller is known. An anonymous caller is
/// denied before any parse error is reported.
fn body_for<R, P>(
    state: &CausaAxumState<R, P>,
    tenant: &TenantContext,
    data: Result<Json<R>, JsonRejection>,
) -> Result<R, CausaAxumError>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    match data {
        Ok(Json(data)) => Ok(data),
        Err(_) if tenant.is_anonymous() => {
            let fallback = state
                .app
                .get(FALLBACK_ROUTE_KEY)
                .unwrap_or_else(|| DEFAULT_FALLBACK_ROUTE.to_string());
            Err(CausaError::not_authenticated("Authentication required")
                .with_redirect(fallback)
                .into_anyhow()
                .into())
        }
        Err(rejection) => Err(map_json_rejection(rejection)),
    }
}

/// Resolve the caller and build the params for one service call.
async fn prepare<R, P>(
    state: &CausaAxumState<R, P>,
    headers: &HeaderMap,
    query: HashMap<String, String>,
    method: &str,
    uri: &Uri,
) -> (TenantContext, P)
where
    R: Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let header = state
        .app
        .get(SESSION_HEADER_KEY)
        .unwrap_or_else(|| DEFAULT_SESSION_HEADER.to_string());
    let caller = Caller::from_headers(&state.resolver, &header, headers).await;

    let params = RestParams::from_parts("rest", headers, query, method, uri)
        .with_session(caller.session);
    (caller.tenant, P::from_rest_params(params))
}

/// REST routes for one service. Only the methods the service lists are
/// routed; the rest answer 405.
pub fn service_router<R, P>(service_name: Arc<String>, state: CausaAxumState<R, P>) -> Router<()>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let methods = state
        .app
        .service(&service_name)
        .map(|h| h.methods())
        .unwrap_or_else(|_| ServiceMethods::standard_crud());

    let mut root: MethodRouter<CausaAxumState<R, P>> = MethodRouter::new();
    let mut item: MethodRouter<CausaAxumState<R, P>> = MethodRouter::new();

    if methods.allows(ServiceMethodKind::Find) {
        let service_name = Arc::clone(&service_name);
        root = root.get(
            move |State(state): State<CausaAxumState<R, P>>,
                  headers: HeaderMap,
                  Query(query): QueryMap,
                  OriginalUri(uri): OriginalUri| async move {
                let (tenant, params) = prepare(&state, &headers, query, "GET", &uri).await;

                let svc = state.app.service(&service_name)?;
                let res = svc.find(tenant, params).await?;
                Ok::<_, CausaAxumError>(Json(res))
            },
        );
    }

    if methods.allows(ServiceMethodKind::Create) {
        let service_name = Arc::clone(&service_name);
        root = root.post(
            move |State(state): State<CausaAxumState<R, P>>,
                  headers: HeaderMap,
                  Query(query): QueryMap,
                  OriginalUri(uri): OriginalUri,
                  data: Result<Json<R>, JsonRejection>| async move {
                let (tenant, params) = prepare(&state, &headers, query, "POST", &uri).await;
                let data = body_for(&state, &tenant, data)?;

                let svc = state.app.service(&service_name)?;
                let res = svc.create(tenant, data, params).await?;
                Ok::<_, CausaAxumError>(Json(res))
            },
        );
    }

    if methods.allows(ServiceMethodKind::Get) {
        let service_name = Arc::clone(&service_name);
        item = item.get(
            move |State(state): State<CausaAxumState<R, P>>,
                  headers: HeaderMap,
                  Query(query): QueryMap,
                  OriginalUri(uri): OriginalUri,
                  Path(id): Path<String>| async move {
                let (tenant, params) = prepare(&state, &headers, query, "GET", &uri).await;

                let svc = state.app.service(&service_name)?;
                let res = svc.get(tenant, &id, params).await?;
                Ok::<_, CausaAxumError>(Json(res))
            },
        );
    }

    if methods.allows(ServiceMethodKind::Update) {
        let service_name = Arc::clone(&service_name);
        item = item.put(
            move |State(state): State<CausaAxumState<R, P>>,
                  headers: HeaderMap,
                  Query(query): QueryMap,
                  OriginalUri(uri): OriginalUri,
                  Path(id): Path<String>,
                  data: Result<Json<R>, JsonRejection>| async move {
                let (tenant, params) = prepare(&state, &headers, query, "PUT", &uri).await;
                let data = body_for(&state, &tenant, data)?;

                let svc = state.app.service(&service_name)?;
                let res = svc.update(tenant, &id, data, params).await?;
                Ok::<_, CausaAxumError>(Json(res))
            },
        );
    }

    if methods.allows(ServiceMethodKind::Patch) {
        let service_name = Arc::clone(&service_name);
        item = item.patch(
            move |State(state): State<CausaAxumState<R, P>>,
                  headers: HeaderMap,
                  Query(query): QueryMap,
                  OriginalUri(uri): OriginalUri,
                  Path(id): Path<String>,
                  data: Result<Json<R>, JsonRejection>| async move {
                let (tenant, params) = prepare(&state, &headers, query, "PATCH", &uri).await;
                let data = body_for(&state, &tenant, data)?;

                let svc = state.app.service(&service_name)?;
                let res = svc.patch(tenant, Some(&id), data, params).await?;
                Ok::<_, CausaAxumError>(Json(res))
            },
        );
    }

    if methods.allows(ServiceMethodKind::Remove) {
        let service_name = Arc::clone(&service_name);
        item = item.delete(
            move |State(state): State<CausaAxumState<R, P>>,
                  headers: HeaderMap,
                  Query(query): QueryMap,
                  OriginalUri(uri): OriginalUri,
                  Path(id): Path<String>| async move {
                let (tenant, params) = prepare(&state, &headers, query, "DELETE", &uri).await;

                let svc = state.app.service(&service_name)?;
                let res = svc.remove(tenant, Some(&id), params).await?;
                Ok::<_, CausaAxumError>(Json(res))
            },
        );
    }

    let has_root = methods.allows(ServiceMethodKind::Find) || methods.allows(ServiceMethodKind::Create);
    let has_item = [
        ServiceMethodKind::Get,
        ServiceMethodKind::Update,
        ServiceMethodKind::Patch,
        ServiceMethodKind::Remove,
    ]
    .into_iter()
    .any(|m| methods.allows(m));

    let mut router = Router::new();
    if has_root {
        router = router.route("/", root);
    }
    if has_item {
        router = router.route("/{id}", item);
    }
    router.with_state(state)
}
