use anyhow::Result;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::validator::field_error;

pub const ERROR_MESSAGE: &str = "Clients schema validation failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClientKind {
    /// Individual (CPF).
    #[default]
    #[serde(rename = "PF")]
    Pf,
    /// Company (CNPJ).
    #[serde(rename = "PJ")]
    Pj,
}

impl ClientKind {
    fn document_digits(self) -> usize {
        match self {
            ClientKind::Pf => 11,
            ClientKind::Pj => 14,
        }
    }

    fn document_name(self) -> &'static str {
        match self {
            ClientKind::Pf => "CPF",
            ClientKind::Pj => "CNPJ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PracticeArea {
    Trabalhista,
    Civil,
    Familia,
    Tributario,
    Empresarial,
    Criminal,
    Outro,
}

/// Full client payload, used for create and update. Patches are merged
/// into the stored record and checked against this too.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClientInput {
    #[serde(default)]
    pub kind: ClientKind,

    #[validate(length(min = 1, max = 100))]
    pub name: String,

    pub document: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 15))]
    pub phone: String,

    pub practice_area: PracticeArea,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default)]
    pub lgpd_consent: bool,
}

impl ClientInput {
    /// Trim text fields and reduce the document to its digits.
    pub fn normalized(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        self.phone = self.phone.trim().to_string();
        self.email = self
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        self.document = normalize_document(self.kind, &self.document)?;
        Ok(self)
    }
}

/// Strip `.`, `-` and `/` and check the digit count for the client kind.
pub fn normalize_document(kind: ClientKind, raw: &str) -> Result<String> {
    let digits: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '.' | '-' | '/'))
        .collect();

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(field_error(ERROR_MESSAGE, "document", "must contain only digits"));
    }
    if digits.len() != kind.document_digits() {
        return Err(field_error(
            ERROR_MESSAGE,
            "document",
            format!(
                "{} must have {} digits",
                kind.document_name(),
                kind.document_digits()
            ),
        ));
    }
    Ok(digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validator::validate;
    use serde_json::json;

    #[test]
    fn documents_are_reduced_to_digits() {
        assert_eq!(
            normalize_document(ClientKind::Pf, "123.456.789-09").unwrap(),
            "12345678909"
        );
        assert_eq!(
            normalize_document(ClientKind::Pj, "12.345.678/0001-95").unwrap(),
            "12345678000195"
        );
        assert!(normalize_document(ClientKind::Pj, "123.456.789-09").is_err());
        assert!(normalize_document(ClientKind::Pf, "123.456.789-0x").is_err());
    }

    #[test]
    fn kind_defaults_to_individual() {
        let input: ClientInput = validate(
            &json!({
                "name": "Maria",
                "document": "12345678909",
                "phone": "11999990000",
                "practice_area": "CIVIL"
            }),
            ERROR_MESSAGE,
        )
        .unwrap();
        assert_eq!(input.kind, ClientKind::Pf);
        assert!(!input.lgpd_consent);
    }

    #[test]
    fn unknown_practice_area_is_rejected() {
        let err = validate::<ClientInput>(
            &json!({
                "name": "Maria",
                "document": "12345678909",
                "phone": "1",
                "practice_area": "MARITIMO"
            }),
            ERROR_MESSAGE,
        );
        assert!(err.is_err());
    }
}
