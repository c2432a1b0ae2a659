use std::sync::Arc;

use axum::body::Body;
use axum::http::HeaderValue;
use axum::http::Request;
use causa_auth::{
    Capability, DelegateId, DelegateRecord, DelegateRole, IdentityResolver, MemoryIdentityStore,
    OwnerId, PermissionGate, RequireCapability, UserId,
};
use causa_axum::{axum, AxumApp, RestParams};
use causa_core::errors::CausaError;
use causa_core::tenant::TenantContext;
use causa_core::{CausaApp, CausaService, ServiceMethodKind, ServiceMethods};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

struct UnprocessableOnCreate;

#[async_trait::async_trait]
impl CausaService<Value, RestParams> for UnprocessableOnCreate {
    fn methods(&self) -> ServiceMethods {
        ServiceMethods::from_methods(vec![ServiceMethodKind::Create])
    }

    async fn create(&self, _ctx: &TenantContext, _data: Value, _params: RestParams) -> anyhow::Result<Value> {
        Err(CausaError::unprocessable("Invalid")
            .with_errors(json!({"name": ["required"]}))
            .into_anyhow())
    }
}

/// Echoes who is calling and in which partition.
struct WhoAmI;

#[async_trait::async_trait]
impl CausaService<Value, RestParams> for WhoAmI {
    fn methods(&self) -> ServiceMethods {
        ServiceMethods::from_methods(vec![ServiceMethodKind::Find, ServiceMethodKind::Remove])
    }

    async fn find(&self, ctx: &TenantContext, _params: RestParams) -> anyhow::Result<Vec<Value>> {
        Ok(vec![json!({
            "tenant": ctx.tenant_id.as_str(),
            "actor": ctx.actor(),
        })])
    }

    async fn remove(&self, _ctx: &TenantContext, id: Option<&str>, _params: RestParams) -> anyhow::Result<Value> {
        Ok(json!({ "removed": id }))
    }
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn store_with_delegate() -> Arc<MemoryIdentityStore> {
    let store = Arc::new(MemoryIdentityStore::new());
    store
        .insert_delegate(
            DelegateRecord {
                id: DelegateId::new("delegate:1"),
                owner: OwnerId::new("ana"),
                user: UserId::new("bia"),
                name: "Bia".into(),
                email: "bia@office.test".into(),
                phone: String::new(),
                role: DelegateRole::Sec,
                active: true,
                created_at: chrono::Utc::now(),
            },
            None,
        )
        .await
        .unwrap();
    store
}

fn plain_app(store: Arc<MemoryIdentityStore>) -> AxumApp<Value, RestParams> {
    let app: CausaApp<Value, RestParams> = CausaApp::new();
    axum(app, IdentityResolver::new(store))
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let ax = plain_app(Arc::new(MemoryIdentityStore::new()))
        .use_service("/clients", Arc::new(UnprocessableOnCreate));

    let mut req = post("/clients", "{\"name\":\"x\"");
    req.headers_mut().insert("x-causa-user", HeaderValue::from_static("ana"));
    let res = ax.router().oneshot(req).await.unwrap();

    assert_eq!(res.status().as_u16(), 400);
    assert!(res.headers().get("x-request-id").is_some());
    let body = json_body(res).await;
    assert_eq!(body["name"], "BadRequest");
    assert_eq!(body["className"], "bad-request");
    assert!(body.get("errors").is_some());
}

#[tokio::test]
async fn anonymous_malformed_body_is_redirected_not_parsed() {
    let ax = plain_app(Arc::new(MemoryIdentityStore::new()))
        .use_service("/clients", Arc::new(UnprocessableOnCreate));

    let res = ax.router().oneshot(post("/clients", "{not json")).await.unwrap();

    assert_eq!(res.status().as_u16(), 303);
    assert_eq!(res.headers().get("location").unwrap(), "/dashboard");
    assert_eq!(json_body(res).await["name"], "NotAuthenticated");
}

#[tokio::test]
async fn request_id_is_preserved_when_provided() {
    let ax = plain_app(Arc::new(MemoryIdentityStore::new()))
        .use_service("/clients", Arc::new(UnprocessableOnCreate));

    let provided = HeaderValue::from_static("req-test-123");
    let mut req = post("/clients", "{}");
    req.headers_mut().insert("x-request-id", provided.clone());
    let res = ax.router().oneshot(req).await.unwrap();

    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
}

#[tokio::test]
async fn unprocessable_keeps_422_and_field_errors() {
    let ax = plain_app(Arc::new(MemoryIdentityStore::new()))
        .use_service("/clients", Arc::new(UnprocessableOnCreate));

    let res = ax.router().oneshot(post("/clients", "{}")).await.unwrap();

    assert_eq!(res.status().as_u16(), 422);
    let body = json_body(res).await;
    assert_eq!(body["name"], "Unprocessable");
    assert_eq!(body["errors"], json!({"name": ["required"]}));
}

#[tokio::test]
async fn unlisted_methods_are_not_routed() {
    let ax = plain_app(Arc::new(MemoryIdentityStore::new()))
        .use_service("/clients", Arc::new(UnprocessableOnCreate));

    let res = ax
        .router()
        .oneshot(Request::builder().uri("/clients").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 405);
}

#[tokio::test]
async fn session_header_scopes_the_call_to_the_owner() {
    let ax = plain_app(store_with_delegate().await).use_service("/whoami", Arc::new(WhoAmI));

    let res = ax
        .router()
        .oneshot(
            Request::builder()
                .uri("/whoami")
                .header("x-causa-user", "bia")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(json_body(res).await, json!([{"tenant": "ana", "actor": "bia"}]));
}

#[tokio::test]
async fn denials_redirect_to_the_fallback() {
    let store = store_with_delegate().await;
    let gate = PermissionGate::new(store.clone());
    let ax = plain_app(store).use_service("/whoami", Arc::new(WhoAmI));
    ax.app
        .service("whoami")
        .unwrap()
        .hooks(|h| {
            h.before_find(Arc::new(RequireCapability::new(gate.clone(), Capability::ListarClientes)));
            h.before_remove(Arc::new(RequireCapability::new(gate.clone(), Capability::ExcluirCliente)));
        });

    // delegate defaults include listar_clientes
    let res = ax
        .router()
        .oneshot(
            Request::builder()
                .uri("/whoami")
                .header("x-causa-user", "bia")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);

    let res = ax
        .router()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/whoami/client:1")
                .header("x-causa-user", "bia")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 303);
    assert_eq!(res.headers().get("location").unwrap(), "/dashboard");
    let body = json_body(res).await;
    assert_eq!(body["name"], "Forbidden");
    assert_eq!(body["data"]["capability"], "excluir_cliente");
    assert!(body["message"].as_str().unwrap().contains("excluir_cliente"));

    let res = ax
        .router()
        .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 303);
    assert_eq!(json_body(res).await["name"], "NotAuthenticated");
}
