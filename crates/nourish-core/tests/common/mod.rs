//! Common test utilities for nourish-core integration tests

pub mod mock_repos;

#[allow(unused_imports)]
pub use mock_repos::{MockDeliveryRepository, MockSubscriptionRepository};

use nourish_types::{Address, GeoPoint};

/// A valid address in Pune
#[allow(dead_code)]
pub fn test_address() -> Address {
    Address {
        label: "Home".to_string(),
        street: "12 MG Road".to_string(),
        city: "Pune".to_string(),
        state: "Maharashtra".to_string(),
        pincode: "411001".to_string(),
        coordinates: Some(GeoPoint::new(18.5204, 73.8567)),
        is_default: true,
    }
}
