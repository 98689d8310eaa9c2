//! Shared handler utilities
//!
//! Metrics and path-id helpers used across handlers.

use std::time::Instant;

use nourish_types::{DeliveryId, OrderId, SubscriptionId};

use crate::error::{ApiError, ApiResult};

// ============================================================================
// Path IDs
// ============================================================================

// Malformed ids are reported exactly like unknown ones.

pub fn subscription_id(raw: &str) -> ApiResult<SubscriptionId> {
    SubscriptionId::parse(raw).map_err(|_| ApiError::SubscriptionNotFound)
}

pub fn delivery_id(raw: &str) -> ApiResult<DeliveryId> {
    DeliveryId::parse(raw).map_err(|_| ApiError::DeliveryNotFound)
}

pub fn order_id(raw: &str) -> ApiResult<OrderId> {
    OrderId::parse(raw).map_err(|_| ApiError::DeliveryNotFound)
}

// ============================================================================
// Metrics Helpers
// ============================================================================

/// Record operation duration with result label.
///
/// Labels: operation, result (ok/err)
#[inline]
pub fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "nourish_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}

/// Time `fut` and record it under `operation`.
pub async fn timed<T, F>(operation: &'static str, fut: F) -> ApiResult<T>
where
    F: std::future::Future<Output = ApiResult<T>>,
{
    let start = Instant::now();
    let result = fut.await;
    record_op_duration(operation, start, result.is_ok());
    result
}

// ============================================================================
// Tests
// ============================================================================
