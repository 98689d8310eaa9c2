//! NourishNet Core - Subscription lifecycle and delivery tracking
//!
//! Both engines are stateless between calls: every operation goes through a
//! repository injected at construction, and all coordination relies on the
//! store's single-row atomic updates.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use nourish_core::{NewSubscription, SubscriptionService};
//! use nourish_db::Repositories;
//! use nourish_types::PlanType;
//!
//! let repos = Repositories::new(pool);
//! let subscriptions = SubscriptionService::new(Arc::new(repos.subscriptions));
//!
//! let sub = subscriptions
//!     .create_plan(NewSubscription::new(user_id, PlanType::Weekly, address))
//!     .await?;
//! subscriptions.pause(sub.id).await?;
//! ```

pub mod config;
pub mod delivery;
pub mod error;
pub mod subscription;

pub use config::DeliveryConfig;
pub use delivery::{DeliveryService, NewDelivery};
pub use error::{CoreError, ErrorKind};
pub use subscription::{NewSubscription, SubscriptionService};

/// Result alias for engine operations
pub type CoreResult<T> = Result<T, CoreError>;
