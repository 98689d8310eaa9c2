//! Delivery tracking engine
//!
//! Status only moves forward and `actual_delivery_time` is written once, in
//! the same conditional update that reaches `delivered`. Tracking updates are
//! blind single-column writes: the record is only read back when a write
//! matched nothing and the caller needs to know why.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use nourish_db::error::ONE_DELIVERY_PER_ORDER_INDEX;
use nourish_db::{CreateDelivery, DeliveryRepository, DeliveryRow};
use nourish_types::{
    validate_distance, validate_eta, validate_route, Address, Delivery, DeliveryId,
    DeliveryPersonId, DeliveryStatus, GeoPoint, OrderId, TrackingInfo, UserId,
};
use uuid::Uuid;

use crate::{CoreError, CoreResult, DeliveryConfig};

/// Input for [`DeliveryService::create`]
#[derive(Debug, Clone)]
pub struct NewDelivery {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub delivery_person_id: DeliveryPersonId,
    pub delivery_address: Address,
    pub tracking_info: TrackingInfo,
}

/// Delivery tracking engine
pub struct DeliveryService<R: ?Sized> {
    repo: Arc<R>,
    config: DeliveryConfig,
}

impl<R: ?Sized> Clone for DeliveryService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            config: self.config.clone(),
        }
    }
}

impl<R: DeliveryRepository + ?Sized> DeliveryService<R> {
    /// Create a new delivery engine over `repo`
    pub fn new(repo: Arc<R>, config: DeliveryConfig) -> Self {
        Self { repo, config }
    }

    /// Engine configuration
    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Open a delivery for a confirmed order
    pub async fn create(&self, new: NewDelivery) -> CoreResult<Delivery> {
        new.delivery_address.validate()?;
        new.tracking_info.validate()?;

        if self.repo.find_by_order_id(new.order_id.0).await?.is_some() {
            return Err(CoreError::DeliveryExists);
        }

        let create = CreateDelivery {
            id: Uuid::new_v4(),
            order_id: new.order_id.0,
            user_id: new.user_id.0,
            delivery_person_id: new.delivery_person_id.0,
            delivery_address: new.delivery_address,
            tracking_info: new.tracking_info,
        };

        let row = self.repo.create(create).await.map_err(|err| {
            if err.violates(ONE_DELIVERY_PER_ORDER_INDEX) {
                CoreError::DeliveryExists
            } else {
                err.into()
            }
        })?;
        let delivery = Delivery::try_from(row)?;

        tracing::info!(
            delivery_id = %delivery.id,
            order_id = %delivery.order_id,
            user_id = %delivery.user_id,
            "Delivery created"
        );

        Ok(delivery)
    }

    /// Look up a delivery by ID
    pub async fn get_by_id(&self, id: DeliveryId) -> CoreResult<Option<Delivery>> {
        self.repo
            .find_by_id(id.0)
            .await?
            .map(to_delivery)
            .transpose()
    }

    /// Look up a delivery by an untrusted ID string
    ///
    /// Malformed IDs are reported as not found.
    pub async fn find_by_raw_id(&self, raw: &str) -> CoreResult<Option<Delivery>> {
        match DeliveryId::parse(raw) {
            Ok(id) => self.get_by_id(id).await,
            Err(_) => Ok(None),
        }
    }

    /// Look up the delivery for an order
    pub async fn get_by_order(&self, order_id: OrderId) -> CoreResult<Option<Delivery>> {
        self.repo
            .find_by_order_id(order_id.0)
            .await?
            .map(to_delivery)
            .transpose()
    }

    /// The user's deliveries, newest first
    pub async fn list_by_user(
        &self,
        user_id: UserId,
        limit: Option<u32>,
    ) -> CoreResult<Vec<Delivery>> {
        let limit = self.config.effective_limit(limit);
        self.repo
            .find_by_user_id(user_id.0, i64::from(limit))
            .await?
            .into_iter()
            .map(to_delivery)
            .collect()
    }

    /// The user's most recent delivery still `preparing` or `out_for_delivery`
    pub async fn get_active_for_user(&self, user_id: UserId) -> CoreResult<Option<Delivery>> {
        self.repo
            .find_active_by_user_id(user_id.0)
            .await?
            .map(to_delivery)
            .transpose()
    }

    /// Move a delivery forward to `target`
    ///
    /// Reaching `delivered` stamps `actual_delivery_time`. Backward moves,
    /// repeats, and anything after `delivered` are rejected.
    pub async fn advance_status(
        &self,
        id: DeliveryId,
        target: DeliveryStatus,
    ) -> CoreResult<Delivery> {
        let current = self.load(id).await?;
        let from = current.status;
        check_advance(from, target)?;

        let Some(row) = self.repo.advance_status(id.0, from, target).await? else {
            // Lost a race with another status update; report against what won.
            let fresh = self.load(id).await?;
            tracing::debug!(
                delivery_id = %id,
                expected = %from,
                found = %fresh.status,
                "Delivery status changed concurrently"
            );
            check_advance(fresh.status, target)?;
            return Err(CoreError::InvalidDeliveryTransition {
                from: fresh.status,
                to: target,
            });
        };

        let delivery = Delivery::try_from(row)?;
        tracing::info!(
            delivery_id = %delivery.id,
            order_id = %delivery.order_id,
            from = %from,
            to = %target,
            "Delivery status advanced"
        );

        Ok(delivery)
    }

    /// Record the courier's current position
    pub async fn update_location(&self, id: DeliveryId, location: GeoPoint) -> CoreResult<()> {
        location.validate()?;
        let updated = self.repo.update_location(id.0, location).await?;
        self.ensure_tracked(id, updated).await
    }

    /// Replace the planned route
    pub async fn update_route(&self, id: DeliveryId, route: Vec<GeoPoint>) -> CoreResult<()> {
        validate_route(&route)?;
        let updated = self.repo.update_route(id.0, &route).await?;
        self.ensure_tracked(id, updated).await
    }

    /// Record remaining minutes and kilometres
    pub async fn update_eta(
        &self,
        id: DeliveryId,
        eta_minutes: u32,
        distance_km: f64,
    ) -> CoreResult<()> {
        validate_eta(eta_minutes)?;
        validate_distance(distance_km)?;
        let updated = self.repo.update_eta(id.0, eta_minutes, distance_km).await?;
        self.ensure_tracked(id, updated).await
    }

    /// Replace the whole tracking structure
    pub async fn replace_tracking(&self, id: DeliveryId, tracking: TrackingInfo) -> CoreResult<()> {
        tracking.validate()?;
        let updated = self.repo.replace_tracking(id.0, &tracking).await?;
        self.ensure_tracked(id, updated).await
    }

    /// Set the promised delivery time
    pub async fn set_estimated_delivery_time(
        &self,
        id: DeliveryId,
        at: DateTime<Utc>,
    ) -> CoreResult<()> {
        let updated = self.repo.set_estimated_delivery_time(id.0, at).await?;
        self.ensure_tracked(id, updated).await
    }

    async fn load(&self, id: DeliveryId) -> CoreResult<Delivery> {
        self.get_by_id(id).await?.ok_or(CoreError::DeliveryNotFound)
    }

    /// Explain a tracking write that matched nothing
    async fn ensure_tracked(&self, id: DeliveryId, updated: bool) -> CoreResult<()> {
        if updated {
            return Ok(());
        }
        match self.repo.find_by_id(id.0).await? {
            None => Err(CoreError::DeliveryNotFound),
            Some(row) if row.status()?.is_terminal() => Err(CoreError::TrackingClosed),
            Some(_) => Err(CoreError::Internal(format!(
                "tracking update for delivery {id} matched no row"
            ))),
        }
    }
}

fn check_advance(from: DeliveryStatus, target: DeliveryStatus) -> CoreResult<()> {
    if from.is_terminal() {
        return Err(CoreError::AlreadyDelivered);
    }
    if !from.can_advance_to(target) {
        return Err(CoreError::InvalidDeliveryTransition { from, to: target });
    }
    Ok(())
}

fn to_delivery(row: DeliveryRow) -> CoreResult<Delivery> {
    Ok(Delivery::try_from(row)?)
}
