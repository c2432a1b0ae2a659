use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::clients::clients_schema::PracticeArea;

pub const ERROR_MESSAGE: &str = "Cases schema validation failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    #[default]
    Andamento,
    Arquivado,
    Concluido,
}

impl CaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseStatus::Andamento => "ANDAMENTO",
            CaseStatus::Arquivado => "ARQUIVADO",
            CaseStatus::Concluido => "CONCLUIDO",
        }
    }

    pub fn is_archived(self) -> bool {
        self == CaseStatus::Arquivado
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CaseInput {
    #[validate(length(min = 1, max = 50))]
    pub number: String,

    #[validate(length(min = 1))]
    pub client_id: String,

    #[validate(length(min = 1))]
    pub description: String,

    #[serde(default)]
    pub status: CaseStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practice_area: Option<PracticeArea>,
}

impl CaseInput {
    pub fn normalized(mut self) -> Self {
        self.number = self.number.trim().to_string();
        self.client_id = self.client_id.trim().to_string();
        self
    }
}

/// The only change a case patch may carry.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CaseStatusPatch {
    pub status: CaseStatus,
}
