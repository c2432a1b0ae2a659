//! Gate hooks for the service pipeline.
//!
//! Register them as `before` hooks; a denial stops the call before the
//! service method runs.
//!
//! ```rust,ignore
//! app.service("clients")?.hooks(|h| {
//!     h.before_find(Arc::new(RequireCapability::new(gate.clone(), Capability::ListarClientes)));
//!     h.before_remove(Arc::new(RequireCapability::new(gate.clone(), Capability::ExcluirCliente)));
//! });
//! ```

pub mod hash_password;
pub mod require;

pub use hash_password::HashPasswordHook;
pub use require::{RequireCapability, RequireOwner, RequireSession};

use crate::principal::Session;

/// Params types that carry the resolved session of the caller.
pub trait SessionParams: Clone + Send + Sync {
    fn session(&self) -> &Session;
}

impl SessionParams for Session {
    fn session(&self) -> &Session {
        self
    }
}
