//! PostgreSQL repository implementations

mod delivery;
mod subscription;

pub use delivery::PgDeliveryRepository;
pub use subscription::PgSubscriptionRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub subscriptions: PgSubscriptionRepository,
    pub deliveries: PgDeliveryRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            subscriptions: PgSubscriptionRepository::new(pool.clone()),
            deliveries: PgDeliveryRepository::new(pool),
        }
    }
}
