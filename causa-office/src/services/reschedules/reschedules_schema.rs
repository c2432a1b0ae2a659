use serde::{Deserialize, Serialize};
use validator::Validate;

pub const ERROR_MESSAGE: &str = "Reschedules schema validation failed";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RescheduleInput {
    #[validate(length(min = 1))]
    pub appointment_id: String,

    /// RFC 3339 instant the appointment moves to.
    pub new_start: String,

    #[serde(default)]
    #[validate(length(max = 500))]
    pub reason: String,
}
