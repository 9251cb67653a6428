//! HTTP error mapping with structured JSON bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use desgen::errors::DesgenError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Pipeline(#[from] DesgenError),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            Self::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone()),
            Self::Pipeline(err) => {
                let status = match err {
                    DesgenError::Provider(e) if e.is_rate_limited() => {
                        StatusCode::TOO_MANY_REQUESTS
                    }
                    DesgenError::Provider(_) | DesgenError::MissingInput(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                    DesgenError::ExhaustedRetries { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    DesgenError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    DesgenError::DataConflict(_) => {
                        tracing::error!(error = %err, "Pipeline invariant violated");
                        return (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "INTERNAL",
                            "An internal error occurred".to_string(),
                        );
                    }
                };
                (status, err.code(), err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use desgen::errors::{
        ConfigurationError, DataConflictError, MissingInputError, ProviderError,
    };

    fn status_of(err: DesgenError) -> (StatusCode, &'static str) {
        let (status, code, _) = ApiError::from(err).parts();
        (status, code)
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(ProviderError::rate_limited("slow down").into()),
            (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED")
        );
        assert_eq!(
            status_of(ProviderError::with_status(500, "boom").into()),
            (StatusCode::BAD_GATEWAY, "PROVIDER")
        );
        assert_eq!(
            status_of(MissingInputError::new("UX Architect", &["product_plan"]).into()),
            (StatusCode::BAD_GATEWAY, "MISSING_INPUT")
        );
        assert_eq!(
            status_of(DesgenError::ExhaustedRetries { attempts: 3 }),
            (StatusCode::SERVICE_UNAVAILABLE, "EXHAUSTED_RETRIES")
        );
        assert_eq!(
            status_of(ConfigurationError::new("missing key").into()),
            (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION")
        );
    }

    #[test]
    fn test_data_conflict_is_hidden() {
        let (status, code, message) =
            ApiError::from(DesgenError::from(DataConflictError::new("ux_design"))).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL");
        assert!(!message.contains("ux_design"));
    }
}
