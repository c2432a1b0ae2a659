//! The permission gate.
//!
//! `authorize` is evaluated fresh on every call: the delegate's capability
//! set is looked up each time, so a change made by the owner applies to the
//! very next request. Every path that is not a clear "yes" is a denial.

use std::future::Future;
use std::sync::Arc;

use causa_core::{CausaConfigSnapshot, CausaError};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::capability::Capability;
use crate::principal::{Principal, Session};
use crate::store::IdentityStore;

pub const DEFAULT_FALLBACK_ROUTE: &str = "/dashboard";
pub const FALLBACK_ROUTE_KEY: &str = "auth.fallback_route";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    Unauthenticated,
    MissingCapability,
    NoCapabilitySet,
    LookupFailed,
    UnknownCapability,
    OwnerOnly,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::Unauthenticated => "unauthenticated",
            DenialReason::MissingCapability => "missing_capability",
            DenialReason::NoCapabilitySet => "no_capability_set",
            DenialReason::LookupFailed => "lookup_failed",
            DenialReason::UnknownCapability => "unknown_capability",
            DenialReason::OwnerOnly => "owner_only",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub reason: DenialReason,
    /// The permission that was asked for, as named by the caller.
    pub capability: String,
    pub message: String,
    pub redirect: String,
}

impl Denial {
    fn new(reason: DenialReason, capability: impl Into<String>, redirect: &str) -> Self {
        let capability = capability.into();
        let message = match reason {
            DenialReason::OwnerOnly => {
                format!("Access denied. Only the account owner may perform: {capability}")
            }
            _ => format!("Access denied. Required permission: {capability}"),
        };
        Self {
            reason,
            capability,
            message,
            redirect: redirect.to_string(),
        }
    }

    /// `NotAuthenticated` for anonymous callers, `Forbidden` otherwise; both
    /// carry the redirect target.
    pub fn into_error(self) -> CausaError {
        let err = match self.reason {
            DenialReason::Unauthenticated => CausaError::not_authenticated(self.message),
            _ => CausaError::forbidden(self.message),
        };
        err.with_data(json!({
            "capability": self.capability,
            "reason": self.reason.as_str(),
            "redirect": self.redirect,
        }))
        .with_redirect(self.redirect)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Decision::Allowed => None,
            Decision::Denied(d) => Some(d),
        }
    }

    pub fn into_result(self) -> anyhow::Result<()> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Denied(d) => Err(d.into_error().into_anyhow()),
        }
    }
}

#[derive(Clone)]
pub struct PermissionGate {
    store: Arc<dyn IdentityStore>,
    fallback: String,
}

impl PermissionGate {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self {
            store,
            fallback: DEFAULT_FALLBACK_ROUTE.to_string(),
        }
    }

    pub fn with_fallback(mut self, route: impl Into<String>) -> Self {
        self.fallback = route.into();
        self
    }

    /// Gate whose fallback comes from `auth.fallback_route`, if set.
    pub fn from_config(store: Arc<dyn IdentityStore>, config: &CausaConfigSnapshot) -> Self {
        let gate = Self::new(store);
        match config.get(FALLBACK_ROUTE_KEY) {
            Some(route) if !route.trim().is_empty() => gate.with_fallback(route),
            _ => gate,
        }
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub async fn authorize(&self, session: &Session, capability: Capability) -> Decision {
        self.authorize_with_redirect(session, capability, None).await
    }

    /// Like [`authorize`](Self::authorize) with a per-call redirect target.
    pub async fn authorize_with_redirect(
        &self,
        session: &Session,
        capability: Capability,
        redirect: Option<&str>,
    ) -> Decision {
        let redirect = redirect.unwrap_or(&self.fallback);

        let principal = match session {
            Session::Anonymous => {
                info!(capability = %capability, "denied: no session");
                return Decision::Denied(Denial::new(
                    DenialReason::Unauthenticated,
                    capability.as_str(),
                    redirect,
                ));
            }
            Session::Authenticated(p) => p,
        };

        let (user, delegate) = match principal {
            Principal::Owner { user } => {
                debug!(user = %user, capability = %capability, "allowed: owner");
                return Decision::Allowed;
            }
            Principal::Delegate { user, delegate, .. } => (user, delegate),
        };

        let reason = match self.store.capability_set(delegate).await {
            Ok(Some(set)) if set.allows(capability) => {
                debug!(user = %user, capability = %capability, "allowed: capability granted");
                return Decision::Allowed;
            }
            Ok(Some(_)) => DenialReason::MissingCapability,
            Ok(None) => DenialReason::NoCapabilitySet,
            Err(e) => {
                warn!(user = %user, error = %e, "capability lookup failed");
                DenialReason::LookupFailed
            }
        };

        info!(user = %user, capability = %capability, reason = reason.as_str(), "denied");
        Decision::Denied(Denial::new(reason, capability.as_str(), redirect))
    }

    /// For capability names coming from outside the program; an unknown name
    /// is denied.
    pub async fn authorize_named(
        &self,
        session: &Session,
        name: &str,
        redirect: Option<&str>,
    ) -> Decision {
        match Capability::parse(name) {
            Ok(capability) => {
                self.authorize_with_redirect(session, capability, redirect)
                    .await
            }
            Err(_) => {
                info!(capability = name, "denied: unknown capability");
                let redirect = redirect.unwrap_or(&self.fallback);
                let reason = if session.is_authenticated() {
                    DenialReason::UnknownCapability
                } else {
                    DenialReason::Unauthenticated
                };
                Decision::Denied(Denial::new(reason, name, redirect))
            }
        }
    }

    /// Allowed only for owners. `action` names the operation in the denial.
    pub fn require_owner(&self, session: &Session, action: &str, redirect: Option<&str>) -> Decision {
        let redirect = redirect.unwrap_or(&self.fallback);
        match session.principal() {
            Some(p) if p.is_owner() => Decision::Allowed,
            Some(p) => {
                info!(user = %p.user(), action, "denied: owner only");
                Decision::Denied(Denial::new(DenialReason::OwnerOnly, action, redirect))
            }
            None => Decision::Denied(Denial::new(DenialReason::Unauthenticated, action, redirect)),
        }
    }

    /// Run `op` only if `session` holds `capability`. On denial `op` is never
    /// called and the denial comes back as a `CausaError`.
    pub async fn guard<T, F, Fut>(
        &self,
        session: &Session,
        capability: Capability,
        redirect: Option<&str>,
        op: F,
    ) -> anyhow::Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        self.authorize_with_redirect(session, capability, redirect)
            .await
            .into_result()?;
        op().await
    }
}
