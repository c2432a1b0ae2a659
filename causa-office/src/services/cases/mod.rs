pub mod cases_schema;
pub mod cases_service;
pub mod cases_shared;

pub use cases_service::CasesService;
