use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use causa_core::errors::CausaError;
use tracing::error;

#[derive(Debug)]
pub struct CausaAxumError(pub anyhow::Error);

impl From<anyhow::Error> for CausaAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for CausaAxumError {
    fn into_response(self) -> Response {
        // CausaError anywhere in the chain keeps its kind; anything else is a 500
        let safe = match CausaError::from_anyhow(&self.0) {
            Some(causa) => causa.sanitize_for_client(),
            None => CausaError::general_error(self.0.to_string()),
        };

        if safe.code() >= 500 {
            error!(error = %self.0, "request failed");
        }

        // denials answer with a redirect to where the caller should go instead
        if let Some(location) = safe
            .redirect
            .as_deref()
            .and_then(|r| HeaderValue::from_str(r).ok())
        {
            return (
                StatusCode::SEE_OTHER,
                [(header::LOCATION, location)],
                Json(safe.to_json()),
            )
                .into_response();
        }

        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
