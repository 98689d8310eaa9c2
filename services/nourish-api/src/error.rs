//! Error types for the NourishNet API service.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use nourish_core::CoreError;
use serde::Serialize;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing or invalid user identity")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Subscription not found")]
    SubscriptionNotFound,

    #[error("Delivery not found")]
    DeliveryNotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::SubscriptionNotFound | Self::DeliveryNotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Core(err) => StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
            Self::DeliveryNotFound => "DELIVERY_NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Core(err) => err.error_code(),
        }
    }

    fn message(&self) -> String {
        match self {
            // Infrastructure detail stays in the logs
            Self::Core(CoreError::Internal(_)) => "Internal server error".to_string(),
            Self::Core(CoreError::StoreUnavailable(_)) => {
                "Service temporarily unavailable".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = ?self, "Internal API error");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use nourish_types::{DeliveryStatus, SubscriptionStatus};

    #[test]
    fn test_core_errors_keep_their_status() {
        let cases = [
            (CoreError::SubscriptionNotFound, StatusCode::NOT_FOUND),
            (CoreError::ActiveSubscriptionExists, StatusCode::CONFLICT),
            (CoreError::DeliveryExists, StatusCode::CONFLICT),
            (
                CoreError::InvalidSubscriptionTransition {
                    from: SubscriptionStatus::Cancelled,
                    to: SubscriptionStatus::Active,
                },
                StatusCode::CONFLICT,
            ),
            (
                CoreError::InvalidDeliveryTransition {
                    from: DeliveryStatus::OutForDelivery,
                    to: DeliveryStatus::Preparing,
                },
                StatusCode::CONFLICT,
            ),
            (CoreError::AlreadyDelivered, StatusCode::CONFLICT),
            (CoreError::TrackingClosed, StatusCode::CONFLICT),
            (CoreError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                CoreError::StoreUnavailable("pool timed out".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                CoreError::Internal("bad row".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let api = ApiError::from(err);
            assert_eq!(api.status_code(), expected, "{api}");
        }
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ApiError::Unauthenticated.error_code(), "UNAUTHENTICATED");
        assert_eq!(
            ApiError::from(CoreError::TrackingClosed).error_code(),
            "TRACKING_CLOSED"
        );
        assert_eq!(
            ApiError::from(CoreError::ActiveSubscriptionExists).error_code(),
            "ACTIVE_SUBSCRIPTION_EXISTS"
        );
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let api = ApiError::from(CoreError::Internal("relation \"x\" does not exist".into()));
        assert_eq!(api.message(), "Internal server error");

        let api = ApiError::from(CoreError::Validation("latitude 95 out of range".into()));
        assert!(api.message().contains("latitude"));
    }

    #[test]
    fn test_response_status() {
        let response = ApiError::Forbidden("not your delivery".into()).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = ApiError::from(CoreError::DeliveryNotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
