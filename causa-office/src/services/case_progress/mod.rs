pub mod case_progress_schema;
pub mod case_progress_service;
pub mod case_progress_shared;

pub use case_progress_service::CaseProgressService;
