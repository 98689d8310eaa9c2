//! Delivery types
//!
//! Delivery status only moves forward:
//!
//! ```text
//!   preparing -> out_for_delivery -> delivered
//! ```
//!
//! Skipping a stage is allowed; going back or repeating a stage is not.
//! Tracking info is orthogonal to status and may change at any time before
//! the delivery is `delivered`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, DeliveryId, DeliveryPersonId, DomainError, GeoPoint, OrderId, UserId};

/// Delivery status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Kitchen is preparing the order
    Preparing,
    /// Courier has picked up the order
    OutForDelivery,
    /// Handed over; terminal
    Delivered,
}

impl DeliveryStatus {
    /// Statuses that make a delivery "active" for its user
    pub const ACTIVE: [Self; 2] = [Self::Preparing, Self::OutForDelivery];

    /// Stored/serialized status name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
        }
    }

    /// Position in the forward sequence
    pub const fn stage(&self) -> u8 {
        match self {
            Self::Preparing => 0,
            Self::OutForDelivery => 1,
            Self::Delivered => 2,
        }
    }

    /// Whether `target` lies strictly after `self`
    pub const fn can_advance_to(self, target: Self) -> bool {
        target.stage() > self.stage()
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    pub const fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "preparing" => Ok(Self::Preparing),
            "out_for_delivery" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            _ => Err(DomainError::InvalidDeliveryStatus(s.to_string())),
        }
    }
}

/// Live tracking data fed by the courier's device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingInfo {
    pub current_location: Option<GeoPoint>,
    pub route: Vec<GeoPoint>,
    /// Minutes until arrival
    pub estimated_time_remaining: Option<u32>,
    /// Kilometres until arrival
    pub distance_remaining: Option<f64>,
}

impl TrackingInfo {
    /// Validate every coordinate, the remaining minutes and the remaining distance
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(point) = &self.current_location {
            point.validate()?;
        }
        validate_route(&self.route)?;
        if let Some(minutes) = self.estimated_time_remaining {
            validate_eta(minutes)?;
        }
        if let Some(km) = self.distance_remaining {
            validate_distance(km)?;
        }
        Ok(())
    }
}

/// Validate every waypoint of a route
pub fn validate_route(route: &[GeoPoint]) -> Result<(), DomainError> {
    route.iter().try_for_each(GeoPoint::validate)
}

/// Distances must be finite and non-negative
pub fn validate_distance(km: f64) -> Result<(), DomainError> {
    if !km.is_finite() || km < 0.0 {
        return Err(DomainError::InvalidDistance(km));
    }
    Ok(())
}

/// Largest remaining-minutes value a delivery may carry
pub const MAX_ETA_MINUTES: u32 = i32::MAX as u32;

/// Remaining minutes must fit the stored integer column
pub fn validate_eta(minutes: u32) -> Result<(), DomainError> {
    if minutes > MAX_ETA_MINUTES {
        return Err(DomainError::EtaOutOfRange(minutes));
    }
    Ok(())
}

/// Delivery of one order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub delivery_person_id: DeliveryPersonId,
    pub status: DeliveryStatus,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    /// Set once, when status reaches `delivered`
    pub actual_delivery_time: Option<DateTime<Utc>>,
    pub delivery_address: Address,
    pub tracking_info: TrackingInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Delivery {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
