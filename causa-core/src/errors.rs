//! # Errors
//!
//! Structured errors with a stable name, status code and class name.
//! They travel through the hook pipeline inside `anyhow::Error` and the
//! transport decides how to serialize them.
//!
//! A denial can carry a redirect target: transports that support it answer
//! with a redirect to that route instead of a plain error status.
//!
//! With feature `serde`, `data` / `errors` are `serde_json::Value` and
//! [`CausaError::to_json`] is available.

use std::fmt;

use anyhow::Error as AnyError;

pub type CausaResult<T> = std::result::Result<T, AnyError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    NotAuthenticated,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    Conflict,
    Unprocessable,
    GeneralError,
    NotImplemented,
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotAuthenticated => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::Conflict => 409,
            ErrorKind::Unprocessable => 422,
            ErrorKind::GeneralError => 500,
            ErrorKind::NotImplemented => 501,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotAuthenticated => "NotAuthenticated",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::MethodNotAllowed => "MethodNotAllowed",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::GeneralError => "GeneralError",
            ErrorKind::NotImplemented => "NotImplemented",
        }
    }

    /// Kebab-cased class name, e.g. `not-found`.
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotAuthenticated => "not-authenticated",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not-found",
            ErrorKind::MethodNotAllowed => "method-not-allowed",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unprocessable => "unprocessable",
            ErrorKind::GeneralError => "general-error",
            ErrorKind::NotImplemented => "not-implemented",
        }
    }
}

#[cfg(feature = "serde")]
pub type ErrorValue = serde_json::Value;

#[cfg(not(feature = "serde"))]
pub type ErrorValue = std::sync::Arc<dyn std::any::Any + Send + Sync>;

/// A structured error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct CausaError {
    pub kind: ErrorKind,
    pub message: String,
    pub data: Option<ErrorValue>,
    pub errors: Option<ErrorValue>,
    /// Route the caller should be sent to instead of seeing a bare error.
    pub redirect: Option<String>,
    pub source: Option<AnyError>,
}

impl CausaError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            errors: None,
            redirect: None,
            source: None,
        }
    }

    pub fn with_data(mut self, data: ErrorValue) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_errors(mut self, errors: ErrorValue) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_redirect(mut self, route: impl Into<String>) -> Self {
        self.redirect = Some(route.into());
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Find a `CausaError` anywhere in an `anyhow` chain.
    pub fn from_anyhow(err: &AnyError) -> Option<&CausaError> {
        err.chain().find_map(|e| e.downcast_ref::<CausaError>())
    }

    /// Keep a `CausaError` as is, wrap anything else as `GeneralError`.
    pub fn normalize(err: AnyError) -> CausaError {
        match err.downcast::<CausaError>() {
            Ok(causa) => causa,
            Err(other) => {
                CausaError::new(ErrorKind::GeneralError, other.to_string()).with_source(other)
            }
        }
    }

    /// Copy suitable for clients: the inner `source` is dropped.
    pub fn sanitize_for_client(&self) -> CausaError {
        CausaError {
            kind: self.kind,
            message: self.message.clone(),
            data: self.data.clone(),
            errors: self.errors.clone(),
            redirect: self.redirect.clone(),
            source: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthenticated, msg)
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotImplemented, msg)
    }
}

impl fmt::Display for CausaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for CausaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(feature = "serde")]
impl CausaError {
    /// JSON payload: `name`, `message`, `code`, `className`, plus `data`,
    /// `errors` and `redirect` when present.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        let mut base = json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if let Some(d) = &self.data {
            base["data"] = d.clone();
        }
        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        if let Some(r) = &self.redirect {
            base["redirect"] = json!(r);
        }
        base
    }
}

/// Return early with a `CausaError`.
#[macro_export]
macro_rules! bail_causa {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::CausaError::$ctor($msg).into_anyhow());
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::CausaError::$ctor(format!($fmt, $($arg)*)).into_anyhow());
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fails() -> CausaResult<()> {
        bail_causa!(not_found, "Client not found: {}", "client:1");
    }

    #[test]
    fn normalize_keeps_structured_errors() {
        let err = CausaError::conflict("duplicate").into_anyhow();
        let normalized = CausaError::normalize(err);
        assert_eq!(normalized.kind, ErrorKind::Conflict);
        assert_eq!(normalized.code(), 409);
    }

    #[test]
    fn normalize_wraps_foreign_errors_as_general() {
        let normalized = CausaError::normalize(anyhow::anyhow!("boom"));
        assert_eq!(normalized.kind, ErrorKind::GeneralError);
        assert_eq!(normalized.message, "boom");
        assert!(normalized.source.is_some());
        assert!(normalized.sanitize_for_client().source.is_none());
    }

    #[test]
    fn bail_macro_formats_message() {
        let err = fails().unwrap_err();
        let causa = CausaError::from_anyhow(&err).unwrap();
        assert_eq!(causa.kind, ErrorKind::NotFound);
        assert_eq!(causa.message, "Client not found: client:1");
    }

    #[test]
    fn from_anyhow_sees_through_context() {
        let err = CausaError::forbidden("no")
            .with_redirect("/dashboard")
            .into_anyhow()
            .context("while listing clients");
        let causa = CausaError::from_anyhow(&err).unwrap();
        assert_eq!(causa.redirect.as_deref(), Some("/dashboard"));
    }
}
