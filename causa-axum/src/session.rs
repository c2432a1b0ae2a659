//! Caller resolution for HTTP requests.
//!
//! The upstream login layer puts the authenticated user id in a header
//! (`x-causa-user` unless `auth.session_header` says otherwise). The
//! resolver turns it into a [`Session`]; the tenant of the call is the
//! session's owner.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use causa_auth::{resolve_owner, IdentityResolver, OwnerId, Session};
use causa_core::TenantContext;

use crate::CausaAxumState;

pub const SESSION_HEADER_KEY: &str = "auth.session_header";
pub const DEFAULT_SESSION_HEADER: &str = "x-causa-user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub session: Session,
    pub tenant: TenantContext,
}

impl Caller {
    pub async fn from_headers(resolver: &IdentityResolver, header: &str, headers: &HeaderMap) -> Self {
        let user = headers.get(header).and_then(|v| v.to_str().ok());
        let session = resolver.resolve_session(user).await;
        let tenant = match session.principal() {
            Some(p) => TenantContext::new(p.owner().0).with_actor(p.user().as_str()),
            None => TenantContext::anonymous(),
        };
        Self { session, tenant }
    }

    pub fn owner(&self) -> Option<OwnerId> {
        resolve_owner(&self.session)
    }
}

impl<R, P> FromRequestParts<CausaAxumState<R, P>> for Caller
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &CausaAxumState<R, P>,
    ) -> Result<Self, Self::Rejection> {
        let header = state
            .app
            .get(SESSION_HEADER_KEY)
            .unwrap_or_else(|| DEFAULT_SESSION_HEADER.to_string());
        Ok(Caller::from_headers(&state.resolver, &header, &parts.headers).await)
    }
}
