pub mod clients_schema;
pub mod clients_service;
pub mod clients_shared;

pub use clients_service::ClientsService;
