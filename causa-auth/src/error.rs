use causa_core::CausaError;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Delegate not found: {0}")]
    DelegateNotFound(String),

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Capability flag must be a boolean: {0}")]
    InvalidFlag(String),

    #[error("Duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    #[error("Invalid delegate: {0}")]
    InvalidDelegate(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Identity store unavailable: {0}")]
    Store(String),
}

impl AuthError {
    pub fn into_anyhow(self) -> anyhow::Error {
        CausaError::from(self).into_anyhow()
    }
}

impl From<AuthError> for CausaError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::DelegateNotFound(_) => CausaError::not_found(message),
            AuthError::UnknownCapability(_) | AuthError::InvalidFlag(_) => {
                CausaError::bad_request(message)
            }
            AuthError::Duplicate { .. } => CausaError::conflict(message),
            AuthError::InvalidDelegate(_) => CausaError::unprocessable(message),
            AuthError::Hash(_) | AuthError::Store(_) => CausaError::general_error(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causa_core::ErrorKind;

    #[test]
    fn maps_to_client_errors() {
        let dup: CausaError = AuthError::Duplicate {
            field: "email",
            value: "a@b.c".into(),
        }
        .into();
        assert_eq!(dup.kind, ErrorKind::Conflict);
        assert_eq!(dup.message, "Duplicate email: a@b.c");

        let unknown: CausaError = AuthError::UnknownCapability("x".into()).into();
        assert_eq!(unknown.code(), 400);
    }
}
