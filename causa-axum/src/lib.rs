//! causa-axum: Axum adapter for Causa.
//!
//! Mounts every registered service as a REST resource, resolves the caller's
//! session from the upstream identity header, scopes the call to the owner's
//! partition and turns permission denials into redirects.

pub mod app;
mod error;
pub mod params;
pub mod rest;
pub mod session;
pub mod state;

pub use app::{axum, AxumApp};
pub use error::CausaAxumError;
pub use params::{FromRestParams, RestParams};
pub use session::{Caller, DEFAULT_SESSION_HEADER, SESSION_HEADER_KEY};
pub use state::CausaAxumState;
