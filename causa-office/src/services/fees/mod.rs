pub mod fees_schema;
pub mod fees_service;
pub mod fees_shared;

pub use fees_service::FeesService;
