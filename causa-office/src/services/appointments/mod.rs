pub mod appointments_schema;
pub mod appointments_service;
pub mod appointments_shared;

pub use appointments_service::AppointmentsService;
