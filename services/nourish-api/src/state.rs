//! Application state for the NourishNet API service.

use std::sync::Arc;

use nourish_core::{DeliveryService, SubscriptionService};
use nourish_db::{DbPool, DeliveryRepository, Repositories, SubscriptionRepository};

use crate::config::Config;

/// Subscription engine over any repository implementation
pub type Subscriptions = SubscriptionService<dyn SubscriptionRepository>;

/// Delivery engine over any repository implementation
pub type Deliveries = DeliveryService<dyn DeliveryRepository>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub subscriptions: Subscriptions,
    pub deliveries: Deliveries,
    /// Database pool (readiness checks)
    pub pool: DbPool,
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(repos: Repositories, pool: DbPool, config: Config) -> Self {
        let subscription_repo: Arc<dyn SubscriptionRepository> = Arc::new(repos.subscriptions);
        let delivery_repo: Arc<dyn DeliveryRepository> = Arc::new(repos.deliveries);

        Self {
            subscriptions: SubscriptionService::new(subscription_repo),
            deliveries: DeliveryService::new(delivery_repo, config.delivery.clone()),
            pool,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
