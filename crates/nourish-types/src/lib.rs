//! NourishNet Types - Shared domain types
//!
//! This crate contains domain types used across NourishNet crates:
//! - Identifiers for users, subscriptions, deliveries and orders
//! - Subscription plans, statuses and the subscription state machine
//! - Delivery statuses, tracking info and the delivery state machine
//! - Address and meal preference snapshots embedded in records

pub mod address;
pub mod delivery;
pub mod error;
pub mod ids;
pub mod plan;
pub mod subscription;

pub use address::*;
pub use delivery::*;
pub use error::*;
pub use ids::*;
pub use plan::*;
pub use subscription::*;
