//! API error handling.
//!
//! Maps the purchases error taxonomy onto HTTP statuses and JSON bodies.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use purchases_common::PurchasesError;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Client-facing message for persistence failures.
pub const DATABASE_ERROR_MESSAGE: &str = "A database error occurred";
/// Client-facing message for any other infrastructure failure.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// API error structure for JSON responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Offending input field, for validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            field: None,
        }
    }
}

/// API error response containing status code and error details.
#[derive(Debug, Clone)]
pub struct ApiErrorResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Error details.
    pub error: ApiError,
    /// Seconds for the `Retry-After` header.
    pub retry_after_secs: Option<u64>,
}

impl ApiErrorResponse {
    /// Creates a new API error response.
    pub fn new(status: StatusCode, error: ApiError) -> Self {
        Self {
            status,
            error,
            retry_after_secs: None,
        }
    }

    /// Creates a 400 response for malformed input.
    pub fn validation(message: impl Into<String>, field: Option<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ApiError {
                code: "VALIDATION_ERROR".to_string(),
                message: message.into(),
                field,
            },
        )
    }

    /// Creates a 404 Not Found response.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message))
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.error)).into_response();
        if let Some(secs) = self.retry_after_secs {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<PurchasesError> for ApiErrorResponse {
    fn from(err: PurchasesError) -> Self {
        let code = err.error_code();

        match err {
            PurchasesError::Validation { message, field } => Self::validation(message, field),
            PurchasesError::ConversionUnavailable { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                ApiError::new(code, err.to_string()),
            ),
            PurchasesError::ConversionOverflow { .. } => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new(code, err.to_string()),
            ),
            PurchasesError::Persistence(ref detail) => {
                error!(code, error = %detail, "Database error");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new(code, DATABASE_ERROR_MESSAGE),
                )
            }
            PurchasesError::SourceUnavailable(ref detail) => {
                error!(code, error = %detail, "Unexpected error");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new(code, UNEXPECTED_ERROR_MESSAGE),
                )
            }
            PurchasesError::RateLimited { retry_after_ms } => Self {
                status: StatusCode::TOO_MANY_REQUESTS,
                error: ApiError::new(code, "Too many requests"),
                retry_after_secs: Some(retry_after_ms.div_ceil(1000).max(1)),
            },
        }
    }
}

impl From<JsonRejection> for ApiErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text(), None)
    }
}

impl From<QueryRejection> for ApiErrorResponse {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text(), None)
    }
}

impl From<PathRejection> for ApiErrorResponse {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text(), Some("id".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use purchases_common::Currency;

    #[test]
    fn test_validation_keeps_field() {
        let response = ApiErrorResponse::from(PurchasesError::validation(
            "Amount must not be negative",
            "amount",
        ));

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error.code, "VALIDATION_ERROR");
        assert_eq!(response.error.field.as_deref(), Some("amount"));
    }

    #[test]
    fn test_conversion_unavailable_is_bad_request() {
        let response = ApiErrorResponse::from(PurchasesError::ConversionUnavailable {
            currency: Currency::new("Euro Zone-Euro"),
            on_or_before: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
        });

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error.code, "CONVERSION_UNAVAILABLE");
        assert!(response.error.message.contains("Euro Zone-Euro"));
    }

    #[test]
    fn test_conversion_overflow_is_unprocessable() {
        let response = ApiErrorResponse::from(PurchasesError::ConversionOverflow {
            amount: rust_decimal::Decimal::MAX,
            rate: rust_decimal::Decimal::TWO,
        });

        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.error.code, "CONVERSION_OVERFLOW");
        assert_eq!(response.error.field, None);
    }

    #[test]
    fn test_infrastructure_detail_is_hidden() {
        let db = ApiErrorResponse::from(PurchasesError::Persistence(
            "connection refused at 10.0.0.5:5432".into(),
        ));
        let source = ApiErrorResponse::from(PurchasesError::SourceUnavailable("HTTP 503".into()));

        assert_eq!(db.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(db.error, ApiError::new("DATABASE_ERROR", DATABASE_ERROR_MESSAGE));
        assert_eq!(source.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            source.error,
            ApiError::new("UNEXPECTED_ERROR", UNEXPECTED_ERROR_MESSAGE)
        );
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = ApiErrorResponse::from(PurchasesError::RateLimited {
            retry_after_ms: 1200,
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
    }

    #[test]
    fn test_retry_after_is_at_least_one_second() {
        let response = ApiErrorResponse::from(PurchasesError::RateLimited { retry_after_ms: 0 });
        assert_eq!(response.retry_after_secs, Some(1));
    }

    #[test]
    fn test_field_omitted_when_absent() {
        let json = serde_json::to_value(ApiError::new("NOT_FOUND", "missing")).unwrap();
        assert_eq!(json, serde_json::json!({"code": "NOT_FOUND", "message": "missing"}));
    }
}
