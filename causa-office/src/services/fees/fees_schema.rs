use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::validator::field_error;

pub const ERROR_MESSAGE: &str = "Fees schema validation failed";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FeeInput {
    #[validate(length(min = 1))]
    pub case_id: String,

    /// Accepts `"1500.5"` or `1500.5`; stored as a two-place string.
    pub amount: Decimal,

    pub due_date: NaiveDate,

    #[serde(default)]
    pub paid: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

impl FeeInput {
    pub fn normalized(mut self) -> Result<Self> {
        if self.amount <= Decimal::ZERO {
            return Err(field_error(ERROR_MESSAGE, "amount", "must be greater than zero"));
        }
        if self.amount.scale() > 2 {
            return Err(field_error(ERROR_MESSAGE, "amount", "must have at most two decimal places"));
        }
        self.amount.rescale(2);
        Ok(self)
    }
}
