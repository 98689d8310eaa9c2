//! Address and preference snapshots
//!
//! Subscriptions and deliveries embed a copy of these structures at creation
//! time. Later edits to a user's address book never reach existing records.

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point without validation
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both coordinates are finite and within range
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(DomainError::LatitudeOutOfRange(self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(DomainError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }
}

/// Structured delivery address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// User-facing label ("Home", "Office")
    #[serde(default)]
    pub label: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
    #[serde(default)]
    pub is_default: bool,
}

impl Address {
    /// Validate embedded coordinates, if any
    pub fn validate(&self) -> Result<(), DomainError> {
        match &self.coordinates {
            Some(point) => point.validate(),
            None => Ok(()),
        }
    }
}

/// Preferred spice level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpiceLevel {
    Mild,
    #[default]
    Medium,
    Hot,
}

/// Preferred portion size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// Meal preferences captured with a subscription
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MealPreferences {
    pub dietary_restrictions: Vec<String>,
    pub spice_level: SpiceLevel,
    pub allergies: Vec<String>,
    pub meal_size: MealSize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_point_bounds() {
        assert!(GeoPoint::new(19.07, 72.87).validate().is_ok());
        assert!(GeoPoint::new(90.0, -180.0).validate().is_ok());
        assert_eq!(
            GeoPoint::new(90.5, 0.0).validate(),
            Err(DomainError::LatitudeOutOfRange(90.5))
        );
        assert_eq!(
            GeoPoint::new(0.0, 181.0).validate(),
            Err(DomainError::LongitudeOutOfRange(181.0))
        );
        assert!(GeoPoint::new(f64::NAN, 0.0).validate().is_err());
    }

    #[test]
    fn preferences_fill_missing_fields() {
        let prefs: MealPreferences =
            serde_json::from_str(r#"{"spice_level":"hot","allergies":["peanut"]}"#).unwrap();
        assert_eq!(prefs.spice_level, SpiceLevel::Hot);
        assert_eq!(prefs.meal_size, MealSize::Medium);
        assert_eq!(prefs.allergies, vec!["peanut".to_string()]);
        assert!(prefs.dietary_restrictions.is_empty());
    }

    #[test]
    fn address_without_coordinates_is_valid() {
        let addr: Address = serde_json::from_str(
            r#"{"street":"12 MG Road","city":"Pune","state":"MH","pincode":"411001"}"#,
        )
        .unwrap();
        assert!(addr.validate().is_ok());
        assert!(!addr.is_default);
    }
}
