//! Tenant scoping.
//!
//! A tenant is one owning lawyer's data partition. Every service call
//! carries the partition it runs in plus the user acting inside it, which
//! is either the owner or one of the owner's delegates.

use std::fmt;

/// Identifier of a data partition (the owning account).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Context passed to services and hooks so every read and write is
/// explicitly partitioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: TenantId,
    /// The authenticated user performing the call, if any.
    pub actor: Option<String>,
}

impl TenantContext {
    pub fn new<S: Into<String>>(tenant: S) -> Self {
        Self {
            tenant_id: TenantId(tenant.into()),
            actor: None,
        }
    }

    /// Context for a caller that has not been resolved to any partition.
    pub fn anonymous() -> Self {
        Self::new("")
    }

    pub fn with_actor<S: Into<String>>(mut self, actor: S) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.tenant_id.0.is_empty()
    }

    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_context_has_no_partition() {
        let ctx = TenantContext::anonymous();
        assert!(ctx.is_anonymous());
        assert_eq!(ctx.actor(), None);
    }

    #[test]
    fn actor_is_kept_alongside_tenant() {
        let ctx = TenantContext::new("owner-1").with_actor("delegate-user");
        assert!(!ctx.is_anonymous());
        assert_eq!(ctx.tenant_id.as_str(), "owner-1");
        assert_eq!(ctx.actor(), Some("delegate-user"));
    }
}
