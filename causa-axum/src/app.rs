use std::sync::Arc;

use axum::handler::Handler;
use axum::http::HeaderName;
use axum::routing::get;
use axum::Router;
use causa_auth::IdentityResolver;
use causa_core::{CausaApp, CausaService};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::params::FromRestParams;
use crate::rest;
use crate::CausaAxumState;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub struct AxumApp<R, P = ()>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub app: Arc<CausaApp<R, P>>,
    resolver: IdentityResolver,
    routes: Router<()>,
}

impl<R, P> Clone for AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: Arc::clone(&self.app),
            resolver: self.resolver.clone(),
            routes: self.routes.clone(),
        }
    }
}

impl<R, P> AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub fn new(app: CausaApp<R, P>, resolver: IdentityResolver) -> Self {
        Self {
            app: Arc::new(app),
            resolver,
            routes: Router::new(),
        }
    }

    pub fn state(&self) -> CausaAxumState<R, P> {
        CausaAxumState {
            app: Arc::clone(&self.app),
            resolver: self.resolver.clone(),
        }
    }

    pub fn use_router(mut self, path: &str, router: Router<()>) -> Self {
        self.routes = self.routes.nest(path, router);
        self
    }

    /// Mount a plain `GET` handler that uses the adapter state.
    pub fn use_get<H, T>(mut self, path: &str, handler: H) -> Self
    where
        H: Handler<T, CausaAxumState<R, P>> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        let router = Router::new().route(path, get(handler)).with_state(self.state());
        self.routes = self.routes.merge(router);
        self
    }

    /// Register `service` under `path` and mount its REST routes there.
    pub fn use_service(mut self, path: &'static str, service: Arc<dyn CausaService<R, P>>) -> Self
    where
        R: Serialize + DeserializeOwned,
        P: FromRestParams,
    {
        let name = path.trim_start_matches('/');
        self.app.register_service(name, service);

        let service_name = Arc::new(name.to_string());
        let router = rest::service_router(Arc::clone(&service_name), self.state());

        self.routes = self.routes.nest(path, router);
        self
    }

    /// Mount REST routes for a service that is already registered on the app.
    pub fn expose_service(mut self, path: &'static str) -> Self
    where
        R: Serialize + DeserializeOwned,
        P: FromRestParams,
    {
        let name = path.trim_start_matches('/');
        let router = rest::service_router(Arc::new(name.to_string()), self.state());
        self.routes = self.routes.nest(path, router);
        self
    }

    /// The final router with tracing and request ids applied.
    pub fn router(&self) -> Router<()> {
        let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
        self.routes
            .clone()
            .layer(PropagateRequestIdLayer::new(request_id.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = ?listener.local_addr()?, "listening");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

pub fn axum<R, P>(app: CausaApp<R, P>, resolver: IdentityResolver) -> AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    AxumApp::new(app, resolver)
}
