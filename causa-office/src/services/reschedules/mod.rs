pub mod reschedules_schema;
pub mod reschedules_service;
pub mod reschedules_shared;

pub use reschedules_service::ReschedulesService;
