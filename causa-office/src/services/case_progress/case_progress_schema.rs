use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const ERROR_MESSAGE: &str = "Case progress schema validation failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressKind {
    Peticao,
    Audiencia,
    Sentenca,
    Recurso,
    Outros,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProgressInput {
    #[validate(length(min = 1))]
    pub case_id: String,

    pub date: NaiveDate,

    #[validate(length(min = 1))]
    pub description: String,

    pub kind: ProgressKind,
}
