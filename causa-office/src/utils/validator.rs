use anyhow::Result;
use causa_core::CausaError;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

fn friendly_message(code: &str) -> Option<&'static str> {
    match code {
        "required" => Some("is required"),
        "email" => Some("must be a valid email"),
        "length" => Some("has invalid length"),
        "range" => Some("is out of range"),
        _ => None,
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn push_field(out: &mut Map<String, Value>, key: &str, msg: String) {
    let entry = out
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(list) = entry {
        list.push(Value::String(msg));
    }
}

fn push_validation_errors(out: &mut Map<String, Value>, prefix: &str, errs: &ValidationErrors) {
    for (field, kind) in errs.errors() {
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let key = join_path(prefix, field);
                for e in field_errors {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .or_else(|| friendly_message(&e.code).map(|m| m.to_string()))
                        .unwrap_or_else(|| e.code.to_string());
                    push_field(out, &key, msg);
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                push_validation_errors(out, &join_path(prefix, field), nested.as_ref());
            }
            ValidationErrorsKind::List(list) => {
                let base = join_path(prefix, field);
                for (idx, nested) in list {
                    push_validation_errors(out, &format!("{base}[{idx}]"), nested.as_ref());
                }
            }
        }
    }
}

/// Unprocessable error with one message for one field.
pub fn field_error(error_message: &str, field: &str, msg: impl Into<String>) -> anyhow::Error {
    CausaError::unprocessable(error_message)
        .with_errors(json!({ field: [msg.into()] }))
        .into_anyhow()
}

/// Deserialize `data` into `T` and run its validators; any failure is a
/// 422 with per-field messages.
pub fn validate<T>(data: &Value, error_message: &str) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let parsed: T = serde_json::from_value(data.clone()).map_err(|e| {
        CausaError::unprocessable(error_message)
            .with_errors(json!({"_schema": [e.to_string()]}))
            .into_anyhow()
    })?;

    parsed.validate().map_err(|e| {
        let mut out = Map::new();
        push_validation_errors(&mut out, "", &e);
        CausaError::unprocessable(error_message)
            .with_errors(Value::Object(out))
            .into_anyhow()
    })?;

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use causa_core::{CausaError, ErrorKind};
    use serde::Deserialize;
    use serde_json::json;
    use validator::Validate;

    use super::validate;

    #[derive(Debug, Deserialize, Validate)]
    struct Contact {
        #[validate(length(min = 1, max = 100))]
        name: String,
        #[validate(email(message = "must be a valid email"))]
        email: String,
    }

    #[test]
    fn field_errors_are_collected_per_field() {
        let err = validate::<Contact>(&json!({"name": "", "email": "nope"}), "Invalid contact")
            .unwrap_err();
        let causa = CausaError::from_anyhow(&err).expect("must be CausaError");

        assert_eq!(causa.kind, ErrorKind::Unprocessable);
        let errors = causa.errors.as_ref().unwrap();
        assert_eq!(errors["name"][0], "has invalid length");
        assert_eq!(errors["email"][0], "must be a valid email");
    }

    #[test]
    fn shape_errors_land_under_schema() {
        let err = validate::<Contact>(&json!({"name": 3}), "Invalid contact").unwrap_err();
        let causa = CausaError::from_anyhow(&err).unwrap();
        assert!(causa.errors.as_ref().unwrap().get("_schema").is_some());
    }
}
