//! causa-core: framework-agnostic core for Causa.
//!
//! Services are registered by name on a [`CausaApp`] and every call runs
//! through the hook pipeline (around → before → service → after → error),
//! scoped to the tenant partition of the caller.

pub mod app;
pub mod config;
pub mod errors;
pub mod hooks;
pub mod registry;
pub mod service;
pub mod tenant;

pub use app::{CausaApp, ServiceCaller, ServiceHandle};
pub use config::{CausaConfig, CausaConfigSnapshot};
pub use errors::{CausaError, ErrorKind};
pub use hooks::{
    CausaAfterHook, CausaAroundHook, CausaBeforeHook, CausaErrorHook, HookContext, HookResult,
    Next, ServiceHooks,
};
pub use registry::ServiceRegistry;
pub use service::{CausaService, ServiceMethodKind, ServiceMethods};
pub use tenant::{TenantContext, TenantId};
