pub mod notifications_service;
pub mod notifications_shared;

pub use notifications_service::NotificationsService;
