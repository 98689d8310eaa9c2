//! Domain validation errors

use thiserror::Error;

/// Errors raised while parsing or validating domain values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Unknown subscription status text
    #[error("invalid subscription status: {0}")]
    InvalidSubscriptionStatus(String),

    /// Unknown delivery status text
    #[error("invalid delivery status: {0}")]
    InvalidDeliveryStatus(String),

    /// Currency code is not three ASCII letters
    #[error("invalid currency code: {0:?}")]
    InvalidCurrency(String),

    /// Price amount below zero
    #[error("price must not be negative: {0}")]
    NegativeAmount(i64),

    /// Latitude outside [-90, 90] or not finite
    #[error("latitude out of range: {0}")]
    LatitudeOutOfRange(f64),

    /// Longitude outside [-180, 180] or not finite
    #[error("longitude out of range: {0}")]
    LongitudeOutOfRange(f64),

    /// Distance negative or not finite
    #[error("invalid distance: {0}")]
    InvalidDistance(f64),

    /// Remaining minutes beyond what the record store can hold
    #[error("estimated time remaining too large: {0} minutes")]
    EtaOutOfRange(u32),
}
