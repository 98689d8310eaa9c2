//! Subscription engine
//!
//! Owns plan-derived dates, the subscription state machine and the
//! one-active-subscription-per-user policy. The engine never reads the clock to
//! expire a subscription; `end_date` and `next_billing_date` are advisory data
//! for the renewal process.

use std::sync::Arc;

use chrono::Utc;
use nourish_db::error::ONE_ACTIVE_SUBSCRIPTION_INDEX;
use nourish_db::{CreateSubscription, DbError, SubscriptionRepository, SubscriptionRow};
use nourish_types::{
    Address, MealPreferences, Money, PlanType, Subscription, SubscriptionId, SubscriptionPatch,
    SubscriptionStatus, UserId,
};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Input for [`SubscriptionService::create_plan`]
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: UserId,
    pub plan_type: PlanType,
    /// Falls back to the plan's list price when absent
    pub price: Option<Money>,
    pub delivery_address: Address,
    pub meal_preferences: MealPreferences,
    pub auto_renew: bool,
}

impl NewSubscription {
    /// Auto-renewing subscription at list price with default preferences
    pub fn new(user_id: UserId, plan_type: PlanType, delivery_address: Address) -> Self {
        Self {
            user_id,
            plan_type,
            price: None,
            delivery_address,
            meal_preferences: MealPreferences::default(),
            auto_renew: true,
        }
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_preferences(mut self, preferences: MealPreferences) -> Self {
        self.meal_preferences = preferences;
        self
    }

    pub fn with_auto_renew(mut self, auto_renew: bool) -> Self {
        self.auto_renew = auto_renew;
        self
    }
}

/// Subscription lifecycle engine
pub struct SubscriptionService<R: ?Sized> {
    repo: Arc<R>,
}

impl<R: ?Sized> Clone for SubscriptionService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
        }
    }
}

impl<R: SubscriptionRepository + ?Sized> SubscriptionService<R> {
    /// Create a new subscription engine over `repo`
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Purchase a plan
    ///
    /// The new subscription starts now, is `active`, and both its end date and
    /// next billing date sit one plan period later.
    pub async fn create_plan(&self, new: NewSubscription) -> CoreResult<Subscription> {
        let price = match new.price {
            Some(price) => price,
            None => new.plan_type.list_price().ok_or_else(|| {
                CoreError::Validation(format!("price required for plan {}", new.plan_type))
            })?,
        };
        price.validate()?;
        new.delivery_address.validate()?;

        if !new.plan_type.is_recognized() {
            tracing::warn!(
                user_id = %new.user_id,
                plan_type = %new.plan_type,
                "Unrecognized plan type, billing on a one-day period"
            );
        }

        if let Some(existing) = self.repo.find_active_by_user_id(new.user_id.0).await? {
            tracing::debug!(
                user_id = %new.user_id,
                subscription_id = %existing.id,
                "Rejecting plan purchase, user already has an active subscription"
            );
            return Err(CoreError::ActiveSubscriptionExists);
        }

        let start_date = Utc::now();
        let end_date = new.plan_type.period_end(start_date);

        let create = CreateSubscription {
            id: Uuid::new_v4(),
            user_id: new.user_id.0,
            plan_type: new.plan_type.as_str().to_string(),
            start_date,
            end_date,
            next_billing_date: end_date,
            price_minor: price.amount_minor,
            currency: price.currency,
            delivery_address: new.delivery_address,
            meal_preferences: new.meal_preferences,
            auto_renew: new.auto_renew,
        };

        let row = self.repo.create(create).await.map_err(active_conflict)?;
        let sub = Subscription::try_from(row)?;

        tracing::info!(
            user_id = %sub.user_id,
            subscription_id = %sub.id,
            plan_type = %sub.plan_type,
            end_date = %sub.end_date,
            "Subscription created"
        );

        Ok(sub)
    }

    /// Look up a subscription by ID
    pub async fn get(&self, id: SubscriptionId) -> CoreResult<Option<Subscription>> {
        self.repo
            .find_by_id(id.0)
            .await?
            .map(to_subscription)
            .transpose()
    }

    /// Look up a subscription by an untrusted ID string
    ///
    /// Malformed IDs are reported as not found.
    pub async fn find_by_raw_id(&self, raw: &str) -> CoreResult<Option<Subscription>> {
        match SubscriptionId::parse(raw) {
            Ok(id) => self.get(id).await,
            Err(_) => Ok(None),
        }
    }

    /// The user's `active` subscription, if any
    pub async fn get_active(&self, user_id: UserId) -> CoreResult<Option<Subscription>> {
        self.repo
            .find_active_by_user_id(user_id.0)
            .await?
            .map(to_subscription)
            .transpose()
    }

    /// All of the user's subscriptions, newest first
    pub async fn list_all(&self, user_id: UserId) -> CoreResult<Vec<Subscription>> {
        self.repo
            .find_by_user_id(user_id.0)
            .await?
            .into_iter()
            .map(to_subscription)
            .collect()
    }

    /// Move a subscription to `target`
    ///
    /// Legal moves are `active <-> paused` and `{active, paused} -> cancelled`.
    /// Resuming is subject to the one-active-subscription policy.
    pub async fn transition(
        &self,
        id: SubscriptionId,
        target: SubscriptionStatus,
    ) -> CoreResult<Subscription> {
        let current = self.load(id).await?;
        let from = current.status;

        if !from.can_transition_to(target) {
            return Err(CoreError::InvalidSubscriptionTransition { from, to: target });
        }

        if target == SubscriptionStatus::Active {
            if let Some(other) = self.repo.find_active_by_user_id(current.user_id.0).await? {
                if other.id != id.0 {
                    return Err(CoreError::ActiveSubscriptionExists);
                }
            }
        }

        let updated = self
            .repo
            .update_status(id.0, from, target)
            .await
            .map_err(active_conflict)?;

        let Some(row) = updated else {
            // Someone else moved it between our read and write.
            let fresh = self.load(id).await?;
            tracing::debug!(
                subscription_id = %id,
                expected = %from,
                found = %fresh.status,
                "Subscription status changed concurrently"
            );
            return Err(CoreError::InvalidSubscriptionTransition {
                from: fresh.status,
                to: target,
            });
        };

        let sub = Subscription::try_from(row)?;
        tracing::info!(
            subscription_id = %sub.id,
            user_id = %sub.user_id,
            from = %from,
            to = %target,
            "Subscription status changed"
        );

        Ok(sub)
    }

    /// `active -> paused`
    pub async fn pause(&self, id: SubscriptionId) -> CoreResult<Subscription> {
        self.transition(id, SubscriptionStatus::Paused).await
    }

    /// `paused -> active`
    pub async fn resume(&self, id: SubscriptionId) -> CoreResult<Subscription> {
        self.transition(id, SubscriptionStatus::Active).await
    }

    /// `{active, paused} -> cancelled`
    pub async fn cancel(&self, id: SubscriptionId) -> CoreResult<Subscription> {
        self.transition(id, SubscriptionStatus::Cancelled).await
    }

    /// Change address, preferences or auto-renew
    pub async fn update_fields(
        &self,
        id: SubscriptionId,
        patch: SubscriptionPatch,
    ) -> CoreResult<Subscription> {
        if patch.is_empty() {
            return Err(CoreError::Validation("no fields to update".to_string()));
        }
        if let Some(address) = &patch.delivery_address {
            address.validate()?;
        }

        let row = self
            .repo
            .update_fields(id.0, &patch)
            .await?
            .ok_or(CoreError::SubscriptionNotFound)?;

        tracing::debug!(subscription_id = %id, "Subscription fields updated");
        to_subscription(row)
    }

    async fn load(&self, id: SubscriptionId) -> CoreResult<Subscription> {
        self.get(id).await?.ok_or(CoreError::SubscriptionNotFound)
    }
}

fn to_subscription(row: SubscriptionRow) -> CoreResult<Subscription> {
    Ok(Subscription::try_from(row)?)
}

fn active_conflict(err: DbError) -> CoreError {
    if err.violates(ONE_ACTIVE_SUBSCRIPTION_INDEX) {
        CoreError::ActiveSubscriptionExists
    } else {
        err.into()
    }
}
