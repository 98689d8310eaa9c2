//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.
//! Nested structures are stored as JSONB and decoded through [`Json`].

use chrono::{DateTime, Utc};
use nourish_types::{
    Address, Delivery, DeliveryStatus, GeoPoint, MealPreferences, Money, PlanType, Subscription,
    SubscriptionStatus, TrackingInfo,
};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::DbError;

/// Subscription row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_type: String,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price_minor: i64,
    pub currency: String,
    pub delivery_address: Json<Address>,
    pub meal_preferences: Json<MealPreferences>,
    pub next_billing_date: DateTime<Utc>,
    pub auto_renew: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Delivery row from the database
#[derive(Debug, Clone, FromRow)]
pub struct DeliveryRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub delivery_person_id: Uuid,
    pub status: String,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub actual_delivery_time: Option<DateTime<Utc>>,
    pub delivery_address: Json<Address>,
    pub current_location: Option<Json<GeoPoint>>,
    pub route: Json<Vec<GeoPoint>>,
    pub estimated_time_remaining: Option<i32>,
    pub distance_remaining: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRow {
    /// Parsed status column
    pub fn status(&self) -> Result<SubscriptionStatus, DbError> {
        self.status
            .parse()
            .map_err(|e: nourish_types::DomainError| DbError::Decode(e.to_string()))
    }
}

impl DeliveryRow {
    /// Parsed status column
    pub fn status(&self) -> Result<DeliveryStatus, DbError> {
        self.status
            .parse()
            .map_err(|e: nourish_types::DomainError| DbError::Decode(e.to_string()))
    }
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DbError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let status = row.status()?;
        Ok(Self {
            id: row.id.into(),
            user_id: row.user_id.into(),
            plan_type: PlanType::from(row.plan_type),
            status,
            start_date: row.start_date,
            end_date: row.end_date,
            price: Money::new(row.price_minor, row.currency),
            delivery_address: row.delivery_address.0,
            meal_preferences: row.meal_preferences.0,
            next_billing_date: row.next_billing_date,
            auto_renew: row.auto_renew,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<DeliveryRow> for Delivery {
    type Error = DbError;

    fn try_from(row: DeliveryRow) -> Result<Self, Self::Error> {
        let status = row.status()?;
        let estimated_time_remaining = row
            .estimated_time_remaining
            .map(u32::try_from)
            .transpose()
            .map_err(|_| DbError::Decode("negative estimated_time_remaining".to_string()))?;

        Ok(Self {
            id: row.id.into(),
            order_id: row.order_id.into(),
            user_id: row.user_id.into(),
            delivery_person_id: row.delivery_person_id.into(),
            status,
            estimated_delivery_time: row.estimated_delivery_time,
            actual_delivery_time: row.actual_delivery_time,
            delivery_address: row.delivery_address.0,
            tracking_info: TrackingInfo {
                current_location: row.current_location.map(|Json(point)| point),
                route: row.route.0,
                estimated_time_remaining,
                distance_remaining: row.distance_remaining,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            label: "Home".into(),
            street: "12 MG Road".into(),
            city: "Pune".into(),
            state: "MH".into(),
            pincode: "411001".into(),
            coordinates: None,
            is_default: true,
        }
    }

    fn delivery_row(status: &str) -> DeliveryRow {
        let now = Utc::now();
        DeliveryRow {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            delivery_person_id: Uuid::new_v4(),
            status: status.to_string(),
            estimated_delivery_time: None,
            actual_delivery_time: None,
            delivery_address: Json(address()),
            current_location: Some(Json(GeoPoint::new(18.5, 73.8))),
            route: Json(vec![]),
            estimated_time_remaining: Some(20),
            distance_remaining: Some(5.0),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn delivery_row_converts() {
        let delivery = Delivery::try_from(delivery_row("out_for_delivery")).unwrap();
        assert_eq!(delivery.status, DeliveryStatus::OutForDelivery);
        assert_eq!(delivery.tracking_info.estimated_time_remaining, Some(20));
        assert_eq!(
            delivery.tracking_info.current_location,
            Some(GeoPoint::new(18.5, 73.8))
        );
    }

    #[test]
    fn unknown_status_is_decode_error() {
        let err = Delivery::try_from(delivery_row("lost")).unwrap_err();
        assert!(matches!(err, DbError::Decode(_)));
    }

    #[test]
    fn negative_eta_is_decode_error() {
        let mut row = delivery_row("preparing");
        row.estimated_time_remaining = Some(-3);
        assert!(matches!(Delivery::try_from(row), Err(DbError::Decode(_))));
    }

    #[test]
    fn subscription_row_keeps_unrecognized_plan() {
        let now = Utc::now();
        let row = SubscriptionRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_type: "fortnightly".into(),
            status: "paused".into(),
            start_date: now,
            end_date: now,
            price_minor: 90_000,
            currency: "INR".into(),
            delivery_address: Json(address()),
            meal_preferences: Json(MealPreferences::default()),
            next_billing_date: now,
            auto_renew: true,
            created_at: now,
            updated_at: now,
        };
        let sub = Subscription::try_from(row).unwrap();
        assert_eq!(sub.status, SubscriptionStatus::Paused);
        assert_eq!(sub.plan_type.as_str(), "fortnightly");
        assert_eq!(sub.price, Money::inr(900));
    }
}
