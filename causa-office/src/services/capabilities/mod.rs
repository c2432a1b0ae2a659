pub mod capabilities_service;
pub mod capabilities_shared;

pub use capabilities_service::CapabilitiesService;
