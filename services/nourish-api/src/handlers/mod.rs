//! REST API handlers

pub mod deliveries;
pub mod health;
pub mod plans;
pub mod shared;
pub mod subscriptions;

pub use deliveries::*;
pub use health::*;
pub use plans::*;
pub use subscriptions::*;
