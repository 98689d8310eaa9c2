//! Mock repositories for testing
//!
//! In-memory stand-ins that honour the same contracts as the PostgreSQL
//! repositories: conditional updates, the partial unique index on active
//! subscriptions, and the unique index on delivery order IDs.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use nourish_db::error::{ONE_ACTIVE_SUBSCRIPTION_INDEX, ONE_DELIVERY_PER_ORDER_INDEX};
use nourish_db::sqlx::types::Json;
use nourish_db::{
    CreateDelivery, CreateSubscription, DbError, DbResult, DeliveryRepository, DeliveryRow,
    SubscriptionRepository, SubscriptionRow,
};
use nourish_types::{DeliveryStatus, GeoPoint, SubscriptionPatch, SubscriptionStatus, TrackingInfo};
use uuid::Uuid;

fn unavailable() -> DbError {
    DbError::from(nourish_db::sqlx::Error::PoolTimedOut)
}

/// Integer column; the engine must never hand over minutes it cannot hold
fn eta_column(minutes: u32) -> i32 {
    i32::try_from(minutes).expect("eta minutes validated before the store")
}

/// In-memory subscription repository for testing
#[derive(Default, Clone)]
pub struct MockSubscriptionRepository {
    subs: Arc<DashMap<Uuid, SubscriptionRow>>,
    insertion_order: Arc<DashMap<Uuid, u64>>,
    seq: Arc<AtomicU64>,
    write_lock: Arc<Mutex<()>>,
    offline: Arc<AtomicBool>,
}

impl MockSubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the pool timed out
    #[allow(dead_code)]
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Raw stored row
    #[allow(dead_code)]
    pub fn row(&self, id: Uuid) -> Option<SubscriptionRow> {
        self.subs.get(&id).map(|r| r.value().clone())
    }

    /// Number of stored subscriptions with status `active` for a user
    #[allow(dead_code)]
    pub fn active_count(&self, user_id: Uuid) -> usize {
        self.subs
            .iter()
            .filter(|r| r.user_id == user_id && r.status == "active")
            .count()
    }

    fn check_online(&self) -> DbResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }

    fn other_active_exists(&self, user_id: Uuid, except: Uuid) -> bool {
        self.subs
            .iter()
            .any(|r| r.user_id == user_id && r.status == "active" && r.id != except)
    }
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        self.check_online()?;
        Ok(self.row(id))
    }

    async fn find_active_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        self.check_online()?;
        Ok(self
            .subs
            .iter()
            .find(|r| r.user_id == user_id && r.status == "active")
            .map(|r| r.value().clone()))
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<SubscriptionRow>> {
        self.check_online()?;
        let mut rows: Vec<_> = self
            .subs
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|r| {
            let seq = self.insertion_order.get(&r.id).map(|s| *s).unwrap_or_default();
            std::cmp::Reverse((r.created_at, seq))
        });
        Ok(rows)
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        self.check_online()?;
        let _guard = self.write_lock.lock().unwrap();
        if self.other_active_exists(sub.user_id, sub.id) {
            return Err(DbError::UniqueViolation(ONE_ACTIVE_SUBSCRIPTION_INDEX.to_string()));
        }

        let now = Utc::now();
        let row = SubscriptionRow {
            id: sub.id,
            user_id: sub.user_id,
            plan_type: sub.plan_type,
            status: "active".to_string(),
            start_date: sub.start_date,
            end_date: sub.end_date,
            price_minor: sub.price_minor,
            currency: sub.currency,
            delivery_address: Json(sub.delivery_address),
            meal_preferences: Json(sub.meal_preferences),
            next_billing_date: sub.next_billing_date,
            auto_renew: sub.auto_renew,
            created_at: now,
            updated_at: now,
        };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.insertion_order.insert(row.id, seq);
        self.subs.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: SubscriptionStatus,
        to: SubscriptionStatus,
    ) -> DbResult<Option<SubscriptionRow>> {
        self.check_online()?;
        let _guard = self.write_lock.lock().unwrap();
        let Some(current) = self.row(id) else {
            return Ok(None);
        };
        if current.status != from.as_str() {
            return Ok(None);
        }
        if to == SubscriptionStatus::Active && self.other_active_exists(current.user_id, id) {
            return Err(DbError::UniqueViolation(ONE_ACTIVE_SUBSCRIPTION_INDEX.to_string()));
        }
        let Some(mut sub) = self.subs.get_mut(&id) else {
            return Ok(None);
        };
        sub.status = to.as_str().to_string();
        sub.updated_at = Utc::now();
        Ok(Some(sub.clone()))
    }

    async fn update_fields(
        &self,
        id: Uuid,
        patch: &SubscriptionPatch,
    ) -> DbResult<Option<SubscriptionRow>> {
        self.check_online()?;
        let Some(mut sub) = self.subs.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(address) = &patch.delivery_address {
            sub.delivery_address = Json(address.clone());
        }
        if let Some(prefs) = &patch.meal_preferences {
            sub.meal_preferences = Json(prefs.clone());
        }
        if let Some(auto_renew) = patch.auto_renew {
            sub.auto_renew = auto_renew;
        }
        sub.updated_at = Utc::now();
        Ok(Some(sub.clone()))
    }
}

/// In-memory delivery repository for testing
#[derive(Default, Clone)]
pub struct MockDeliveryRepository {
    deliveries: Arc<DashMap<Uuid, DeliveryRow>>,
    insertion_order: Arc<DashMap<Uuid, u64>>,
    seq: Arc<AtomicU64>,
    write_lock: Arc<Mutex<()>>,
    reads: Arc<AtomicUsize>,
    offline: Arc<AtomicBool>,
}

impl MockDeliveryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the pool timed out
    #[allow(dead_code)]
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of single-record reads served so far
    #[allow(dead_code)]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Raw stored row
    #[allow(dead_code)]
    pub fn row(&self, id: Uuid) -> Option<DeliveryRow> {
        self.deliveries.get(&id).map(|r| r.value().clone())
    }

    /// Overwrite a stored row's creation time
    #[allow(dead_code)]
    pub fn set_created_at(&self, id: Uuid, at: DateTime<Utc>) {
        if let Some(mut row) = self.deliveries.get_mut(&id) {
            row.created_at = at;
        }
    }

    fn check_online(&self) -> DbResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }

    fn sorted_for_user(&self, user_id: Uuid) -> Vec<DeliveryRow> {
        let mut rows: Vec<_> = self
            .deliveries
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|r| {
            let seq = self.insertion_order.get(&r.id).map(|s| *s).unwrap_or_default();
            std::cmp::Reverse((r.created_at, seq))
        });
        rows
    }

    /// Apply `f` to an open (not delivered) delivery
    fn update_open(&self, id: Uuid, f: impl FnOnce(&mut DeliveryRow)) -> DbResult<bool> {
        self.check_online()?;
        let Some(mut row) = self.deliveries.get_mut(&id) else {
            return Ok(false);
        };
        if row.status == DeliveryStatus::Delivered.as_str() {
            return Ok(false);
        }
        f(&mut row);
        row.updated_at = Utc::now();
        Ok(true)
    }
}

#[async_trait]
impl DeliveryRepository for MockDeliveryRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DeliveryRow>> {
        self.check_online()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.row(id))
    }

    async fn find_by_order_id(&self, order_id: Uuid) -> DbResult<Option<DeliveryRow>> {
        self.check_online()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .deliveries
            .iter()
            .find(|r| r.order_id == order_id)
            .map(|r| r.value().clone()))
    }

    async fn find_by_user_id(&self, user_id: Uuid, limit: i64) -> DbResult<Vec<DeliveryRow>> {
        self.check_online()?;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self.sorted_for_user(user_id).into_iter().take(limit).collect())
    }

    async fn find_active_by_user_id(&self, user_id: Uuid) -> DbResult<Option<DeliveryRow>> {
        self.check_online()?;
        Ok(self
            .sorted_for_user(user_id)
            .into_iter()
            .find(|r| r.status != DeliveryStatus::Delivered.as_str()))
    }

    async fn create(&self, delivery: CreateDelivery) -> DbResult<DeliveryRow> {
        self.check_online()?;
        let _guard = self.write_lock.lock().unwrap();
        if self
            .deliveries
            .iter()
            .any(|r| r.order_id == delivery.order_id)
        {
            return Err(DbError::UniqueViolation(ONE_DELIVERY_PER_ORDER_INDEX.to_string()));
        }

        let now = Utc::now();
        let tracking = delivery.tracking_info;
        let row = DeliveryRow {
            id: delivery.id,
            order_id: delivery.order_id,
            user_id: delivery.user_id,
            delivery_person_id: delivery.delivery_person_id,
            status: DeliveryStatus::Preparing.as_str().to_string(),
            estimated_delivery_time: None,
            actual_delivery_time: None,
            delivery_address: Json(delivery.delivery_address),
            current_location: tracking.current_location.map(Json),
            route: Json(tracking.route),
            estimated_time_remaining: tracking.estimated_time_remaining.map(eta_column),
            distance_remaining: tracking.distance_remaining,
            created_at: now,
            updated_at: now,
        };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.insertion_order.insert(row.id, seq);
        self.deliveries.insert(row.id, row.clone());
        Ok(row)
    }

    async fn advance_status(
        &self,
        id: Uuid,
        from: DeliveryStatus,
        to: DeliveryStatus,
    ) -> DbResult<Option<DeliveryRow>> {
        self.check_online()?;
        let Some(mut row) = self.deliveries.get_mut(&id) else {
            return Ok(None);
        };
        if row.status != from.as_str() || row.actual_delivery_time.is_some() {
            return Ok(None);
        }
        let now = Utc::now();
        row.status = to.as_str().to_string();
        if to == DeliveryStatus::Delivered {
            row.actual_delivery_time = Some(now);
        }
        row.updated_at = now;
        Ok(Some(row.clone()))
    }

    async fn update_location(&self, id: Uuid, location: GeoPoint) -> DbResult<bool> {
        self.update_open(id, |row| row.current_location = Some(Json(location)))
    }

    async fn update_route(&self, id: Uuid, route: &[GeoPoint]) -> DbResult<bool> {
        self.update_open(id, |row| row.route = Json(route.to_vec()))
    }

    async fn update_eta(&self, id: Uuid, eta_minutes: u32, distance_km: f64) -> DbResult<bool> {
        self.update_open(id, |row| {
            row.estimated_time_remaining = Some(eta_column(eta_minutes));
            row.distance_remaining = Some(distance_km);
        })
    }

    async fn replace_tracking(&self, id: Uuid, tracking: &TrackingInfo) -> DbResult<bool> {
        self.update_open(id, |row| {
            row.current_location = tracking.current_location.map(Json);
            row.route = Json(tracking.route.clone());
            row.estimated_time_remaining = tracking.estimated_time_remaining.map(eta_column);
            row.distance_remaining = tracking.distance_remaining;
        })
    }

    async fn set_estimated_delivery_time(&self, id: Uuid, at: DateTime<Utc>) -> DbResult<bool> {
        self.update_open(id, |row| row.estimated_delivery_time = Some(at))
    }
}
