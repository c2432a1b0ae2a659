use anyhow::Result;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::clock::{format_ts, parse_instant};
use crate::utils::validator::field_error;

pub const ERROR_MESSAGE: &str = "Appointments schema validation failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentKind {
    Forum,
    Virtual,
    Atendimento,
    Sessao,
    Conciliacao,
    Reuniao,
}

fn default_location() -> String {
    "Escritório".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppointmentInput {
    #[serde(default)]
    pub case_id: Option<String>,

    #[serde(default)]
    pub client_id: Option<String>,

    pub starts_at: String,

    pub kind: AppointmentKind,

    #[serde(default = "default_location")]
    #[validate(length(max = 200))]
    pub location: String,

    #[serde(default)]
    #[validate(length(max = 200))]
    pub court: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

impl AppointmentInput {
    /// Exactly one of case / client, and a UTC `starts_at`.
    pub fn normalized(mut self) -> Result<Self> {
        let blank_to_none = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        self.case_id = blank_to_none(self.case_id);
        self.client_id = blank_to_none(self.client_id);

        match (&self.case_id, &self.client_id) {
            (Some(_), Some(_)) => {
                return Err(field_error(ERROR_MESSAGE, "client_id", "choose either a case or a client"))
            }
            (None, None) => {
                return Err(field_error(ERROR_MESSAGE, "case_id", "a case or a client is required"))
            }
            _ => {}
        }

        let at = parse_instant(&self.starts_at)
            .ok_or_else(|| field_error(ERROR_MESSAGE, "starts_at", "must be an RFC 3339 date-time"))?;
        self.starts_at = format_ts(at);
        Ok(self)
    }
}
