//! Repository traits
//!
//! Define async repository interfaces for the record store. Every mutating
//! method is a single-row conditional update: it either applies atomically and
//! reports the change, or reports that the filter matched nothing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nourish_types::{
    Address, DeliveryStatus, GeoPoint, MealPreferences, SubscriptionPatch, SubscriptionStatus,
    TrackingInfo,
};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Find the `active` subscription for a user
    async fn find_active_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Find all subscriptions for a user, newest first
    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<SubscriptionRow>>;

    /// Create a new subscription with status `active`
    ///
    /// Fails with [`crate::DbError::UniqueViolation`] when the user already has
    /// an active subscription.
    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow>;

    /// Move `id` from `from` to `to`
    ///
    /// Returns `None` if no subscription with that ID currently has status
    /// `from`.
    async fn update_status(
        &self,
        id: Uuid,
        from: SubscriptionStatus,
        to: SubscriptionStatus,
    ) -> DbResult<Option<SubscriptionRow>>;

    /// Apply the set fields of `patch`; `None` if the ID is unknown
    async fn update_fields(
        &self,
        id: Uuid,
        patch: &SubscriptionPatch,
    ) -> DbResult<Option<SubscriptionRow>>;
}

/// Create subscription input
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_type: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub next_billing_date: DateTime<Utc>,
    pub price_minor: i64,
    pub currency: String,
    pub delivery_address: Address,
    pub meal_preferences: MealPreferences,
    pub auto_renew: bool,
}

/// Delivery repository trait
///
/// Tracking updates only match deliveries that are not yet `delivered`; a
/// `false` result means the ID is unknown or the delivery is closed.
#[async_trait]
pub trait DeliveryRepository: Send + Sync {
    /// Find a delivery by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DeliveryRow>>;

    /// Find the delivery for an order
    async fn find_by_order_id(&self, order_id: Uuid) -> DbResult<Option<DeliveryRow>>;

    /// Find a user's deliveries, newest first
    async fn find_by_user_id(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<DeliveryRow>>;

    /// Find the most recent `preparing` or `out_for_delivery` delivery for a user
    async fn find_active_by_user_id(&self, user_id: Uuid) -> DbResult<Option<DeliveryRow>>;

    /// Create a new delivery with status `preparing`
    ///
    /// Fails with [`crate::DbError::UniqueViolation`] when the order already
    /// has a delivery.
    async fn create(&self, delivery: CreateDelivery) -> DbResult<DeliveryRow>;

    /// Move `id` from `from` to `to`
    ///
    /// Moving to `delivered` stamps `actual_delivery_time` in the same update,
    /// and only if it is still unset. Returns `None` when the filter matched
    /// nothing.
    async fn advance_status(
        &self,
        id: Uuid,
        from: DeliveryStatus,
        to: DeliveryStatus,
    ) -> DbResult<Option<DeliveryRow>>;

    /// Set `tracking_info.current_location`
    async fn update_location(&self, id: Uuid, location: GeoPoint) -> DbResult<bool>;

    /// Set `tracking_info.route`
    async fn update_route(&self, id: Uuid, route: &[GeoPoint]) -> DbResult<bool>;

    /// Set `tracking_info.estimated_time_remaining` and `distance_remaining`
    async fn update_eta(&self, id: Uuid, eta_minutes: u32, distance_km: f64) -> DbResult<bool>;

    /// Replace the whole tracking structure
    async fn replace_tracking(&self, id: Uuid, tracking: &TrackingInfo) -> DbResult<bool>;

    /// Set the estimated delivery time
    async fn set_estimated_delivery_time(&self, id: Uuid, at: DateTime<Utc>) -> DbResult<bool>;
}

/// Create delivery input
#[derive(Debug, Clone)]
pub struct CreateDelivery {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub delivery_person_id: Uuid,
    pub delivery_address: Address,
    pub tracking_info: TrackingInfo,
}
