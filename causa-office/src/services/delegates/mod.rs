pub mod delegates_hooks;
pub mod delegates_schema;
pub mod delegates_service;
pub mod delegates_shared;

pub use delegates_service::DelegatesService;
