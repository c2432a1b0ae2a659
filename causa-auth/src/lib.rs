//! causa-auth: who owns the data a request touches, and may the caller
//! touch it.
//!
//! - [`IdentityResolver`] turns the upstream-authenticated user id into a
//!   [`Session`] holding a resolved [`Principal`].
//! - [`resolve_owner`] gives the partition (owner) a session works in.
//! - [`PermissionGate`] decides a [`Capability`] for a session: owners are
//!   always allowed, delegates go through their [`CapabilitySet`], anything
//!   else is denied.
//! - [`hooks`] plugs the gate into the service pipeline.

pub mod capability;
pub mod error;
pub mod gate;
pub mod hooks;
pub mod password;
pub mod principal;
pub mod resolver;
pub mod store;

pub use capability::{Capability, CapabilitySet};
pub use error::AuthError;
pub use gate::{
    Decision, Denial, DenialReason, PermissionGate, DEFAULT_FALLBACK_ROUTE, FALLBACK_ROUTE_KEY,
};
pub use hooks::{HashPasswordHook, RequireCapability, RequireOwner, RequireSession, SessionParams};
pub use principal::{resolve_owner, DelegateId, OwnerId, Principal, Session, UserId};
pub use resolver::IdentityResolver;
pub use store::{DelegateChanges, DelegateRecord, DelegateRole, IdentityStore, MemoryIdentityStore};
