//! PostgreSQL delivery repository implementation
//!
//! Tracking info is spread over dedicated columns so that each live-feed
//! update writes only the columns it owns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nourish_types::{DeliveryStatus, GeoPoint, TrackingInfo, MAX_ETA_MINUTES};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::DeliveryRow;
use crate::repo::{CreateDelivery, DeliveryRepository};

const COLUMNS: &str = "id, order_id, user_id, delivery_person_id, status, \
                       estimated_delivery_time, actual_delivery_time, delivery_address, \
                       current_location, route, estimated_time_remaining, distance_remaining, \
                       created_at, updated_at";

/// PostgreSQL delivery repository
#[derive(Clone)]
pub struct PgDeliveryRepository {
    pool: PgPool,
}

impl PgDeliveryRepository {
    /// Create a new delivery repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Callers bound minutes with `validate_eta` before they reach the store
fn eta_column(minutes: u32) -> i32 {
    debug_assert!(minutes <= MAX_ETA_MINUTES);
    minutes as i32
}

#[async_trait]
impl DeliveryRepository for PgDeliveryRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DeliveryRow>> {
        let sql = format!("SELECT {COLUMNS} FROM deliveries WHERE id = $1");
        let row = sqlx::query_as::<_, DeliveryRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_by_order_id(&self, order_id: Uuid) -> DbResult<Option<DeliveryRow>> {
        let sql = format!("SELECT {COLUMNS} FROM deliveries WHERE order_id = $1");
        let row = sqlx::query_as::<_, DeliveryRow>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_by_user_id(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<DeliveryRow>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM deliveries \
             WHERE user_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2"
        );
        let rows = sqlx::query_as::<_, DeliveryRow>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn find_active_by_user_id(&self, user_id: Uuid) -> DbResult<Option<DeliveryRow>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM deliveries \
             WHERE user_id = $1 AND status IN ('preparing', 'out_for_delivery') \
             ORDER BY created_at DESC \
             LIMIT 1"
        );
        let row = sqlx::query_as::<_, DeliveryRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn create(&self, delivery: CreateDelivery) -> DbResult<DeliveryRow> {
        let tracking = &delivery.tracking_info;
        let sql = format!(
            "INSERT INTO deliveries (id, order_id, user_id, delivery_person_id, status, \
                                     delivery_address, current_location, route, \
                                     estimated_time_remaining, distance_remaining) \
             VALUES ($1, $2, $3, $4, 'preparing', $5, $6, $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, DeliveryRow>(&sql)
            .bind(delivery.id)
            .bind(delivery.order_id)
            .bind(delivery.user_id)
            .bind(delivery.delivery_person_id)
            .bind(Json(&delivery.delivery_address))
            .bind(tracking.current_location.map(Json))
            .bind(Json(&tracking.route))
            .bind(tracking.estimated_time_remaining.map(eta_column))
            .bind(tracking.distance_remaining)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn advance_status(
        &self,
        id: Uuid,
        from: DeliveryStatus,
        to: DeliveryStatus,
    ) -> DbResult<Option<DeliveryRow>> {
        let sql = format!(
            "UPDATE deliveries SET \
                 status = $3, \
                 actual_delivery_time = CASE WHEN $3 = 'delivered' THEN NOW() \
                                             ELSE actual_delivery_time END, \
                 updated_at = NOW() \
             WHERE id = $1 AND status = $2 AND actual_delivery_time IS NULL \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, DeliveryRow>(&sql)
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn update_location(&self, id: Uuid, location: GeoPoint) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE deliveries SET current_location = $2, updated_at = NOW() \
             WHERE id = $1 AND status <> 'delivered'",
        )
        .bind(id)
        .bind(Json(location))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_route(&self, id: Uuid, route: &[GeoPoint]) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE deliveries SET route = $2, updated_at = NOW() \
             WHERE id = $1 AND status <> 'delivered'",
        )
        .bind(id)
        .bind(Json(route))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_eta(&self, id: Uuid, eta_minutes: u32, distance_km: f64) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE deliveries SET estimated_time_remaining = $2, distance_remaining = $3, \
                                   updated_at = NOW() \
             WHERE id = $1 AND status <> 'delivered'",
        )
        .bind(id)
        .bind(eta_column(eta_minutes))
        .bind(distance_km)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn replace_tracking(&self, id: Uuid, tracking: &TrackingInfo) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE deliveries SET current_location = $2, route = $3, \
                                   estimated_time_remaining = $4, distance_remaining = $5, \
                                   updated_at = NOW() \
             WHERE id = $1 AND status <> 'delivered'",
        )
        .bind(id)
        .bind(tracking.current_location.map(Json))
        .bind(Json(&tracking.route))
        .bind(tracking.estimated_time_remaining.map(eta_column))
        .bind(tracking.distance_remaining)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_estimated_delivery_time(&self, id: Uuid, at: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE deliveries SET estimated_delivery_time = $2, updated_at = NOW() \
             WHERE id = $1 AND status <> 'delivered'",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eta_column_keeps_validated_minutes() {
        assert_eq!(eta_column(20), 20);
        assert_eq!(eta_column(MAX_ETA_MINUTES), i32::MAX);
    }
}
