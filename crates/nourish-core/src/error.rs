//! Engine errors
//!
//! Lookups that miss return `Ok(None)` and never surface here. Everything in
//! this enum is a failure the caller must act on.

use nourish_db::DbError;
use nourish_types::{DeliveryStatus, DomainError, SubscriptionStatus};
use thiserror::Error;

/// Coarse error category, used by callers to pick a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidState,
    Validation,
    StoreUnavailable,
    Internal,
}

/// Subscription and delivery engine errors
#[derive(Error, Debug)]
pub enum CoreError {
    /// Mutation targeted an unknown subscription
    #[error("subscription not found")]
    SubscriptionNotFound,

    /// Mutation targeted an unknown delivery
    #[error("delivery not found")]
    DeliveryNotFound,

    /// User already holds an active subscription
    #[error("user already has an active subscription")]
    ActiveSubscriptionExists,

    /// Order already has a delivery
    #[error("order already has a delivery")]
    DeliveryExists,

    /// Illegal subscription status change
    #[error("cannot move subscription from {from} to {to}")]
    InvalidSubscriptionTransition {
        from: SubscriptionStatus,
        to: SubscriptionStatus,
    },

    /// Illegal delivery status change
    #[error("cannot move delivery from {from} to {to}")]
    InvalidDeliveryTransition {
        from: DeliveryStatus,
        to: DeliveryStatus,
    },

    /// Delivery was already confirmed; its delivery time is fixed
    #[error("delivery already delivered")]
    AlreadyDelivered,

    /// Tracking updates are not accepted after delivery
    #[error("delivery is closed for tracking updates")]
    TrackingClosed,

    /// Caller supplied a malformed value
    #[error("validation failed: {0}")]
    Validation(String),

    /// Record store could not be reached
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Error category
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SubscriptionNotFound | Self::DeliveryNotFound => ErrorKind::NotFound,
            Self::ActiveSubscriptionExists | Self::DeliveryExists => ErrorKind::Conflict,
            Self::InvalidSubscriptionTransition { .. }
            | Self::InvalidDeliveryTransition { .. }
            | Self::AlreadyDelivered
            | Self::TrackingClosed => ErrorKind::InvalidState,
            Self::Validation(_) => ErrorKind::Validation,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict | ErrorKind::InvalidState => 409,
            ErrorKind::Validation => 400,
            ErrorKind::StoreUnavailable => 503,
            ErrorKind::Internal => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
            Self::DeliveryNotFound => "DELIVERY_NOT_FOUND",
            Self::ActiveSubscriptionExists => "ACTIVE_SUBSCRIPTION_EXISTS",
            Self::DeliveryExists => "DELIVERY_EXISTS",
            Self::InvalidSubscriptionTransition { .. } => "INVALID_SUBSCRIPTION_TRANSITION",
            Self::InvalidDeliveryTransition { .. } => "INVALID_DELIVERY_TRANSITION",
            Self::AlreadyDelivered => "ALREADY_DELIVERED",
            Self::TrackingClosed => "TRACKING_CLOSED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether a later retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        if err.is_unavailable() {
            tracing::warn!(error = %err, "Record store unavailable");
            return Self::StoreUnavailable(err.to_string());
        }
        tracing::error!(error = %err, "Record store error");
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_kind() {
        assert_eq!(CoreError::SubscriptionNotFound.status_code(), 404);
        assert_eq!(CoreError::ActiveSubscriptionExists.status_code(), 409);
        assert_eq!(CoreError::AlreadyDelivered.status_code(), 409);
        assert_eq!(CoreError::Validation("x".into()).status_code(), 400);
        assert_eq!(CoreError::StoreUnavailable("x".into()).status_code(), 503);
        assert_eq!(CoreError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn transitions_are_invalid_state() {
        let err = CoreError::InvalidSubscriptionTransition {
            from: SubscriptionStatus::Cancelled,
            to: SubscriptionStatus::Active,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.to_string(), "cannot move subscription from cancelled to active");
    }

    #[test]
    fn pool_timeout_is_transient() {
        let err = CoreError::from(DbError::from(nourish_db::sqlx::Error::PoolTimedOut));
        assert!(err.is_transient());
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);

        let err = CoreError::from(DbError::Decode("bad status".into()));
        assert!(!err.is_transient());
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
