//! Subscription handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use nourish_core::NewSubscription;
use nourish_types::{
    Address, MealPreferences, Money, PlanType, Subscription, SubscriptionPatch, UserId,
    DEFAULT_CURRENCY,
};
use serde::Deserialize;

use super::shared::{subscription_id, timed};
use crate::error::{ApiError, ApiResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PriceRequest {
    /// Minor units (paise for INR)
    pub amount_minor: i64,
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub plan_type: PlanType,
    /// Defaults to the plan's list price
    pub price: Option<PriceRequest>,
    pub delivery_address: Address,
    #[serde(default)]
    pub meal_preferences: MealPreferences,
    pub auto_renew: Option<bool>,
}

impl CreateSubscriptionRequest {
    fn into_new(self, user_id: UserId) -> NewSubscription {
        let mut new = NewSubscription::new(user_id, self.plan_type, self.delivery_address)
            .with_preferences(self.meal_preferences);
        if let Some(price) = self.price {
            let currency = price
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
            new = new.with_price(Money::new(price.amount_minor, currency));
        }
        if let Some(auto_renew) = self.auto_renew {
            new = new.with_auto_renew(auto_renew);
        }
        new
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/v1/subscriptions
pub async fn list_subscriptions(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Subscription>>> {
    timed("list_subscriptions", async move {
        Ok(Json(state.subscriptions.list_all(*user).await?))
    })
    .await
}

/// GET /api/v1/subscriptions/active
///
/// `null` when the user has no active subscription.
pub async fn get_active_subscription(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Option<Subscription>>> {
    timed("get_active_subscription", async move {
        Ok(Json(state.subscriptions.get_active(*user).await?))
    })
    .await
}

/// POST /api/v1/subscriptions
pub async fn create_subscription(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<CreateSubscriptionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Subscription>)> {
    let Json(req) = payload?;

    timed("create_subscription", async move {
        let sub = state.subscriptions.create_plan(req.into_new(*user)).await?;
        metrics::counter!(
            "nourish_subscriptions_created_total",
            "plan_type" => metric_plan_label(&sub.plan_type)
        )
        .increment(1);
        Ok((StatusCode::CREATED, Json(sub)))
    })
    .await
}

/// GET /api/v1/subscriptions/{id}
pub async fn get_subscription(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Subscription>> {
    timed("get_subscription", async move {
        Ok(Json(owned(&state, user, &id).await?))
    })
    .await
}

/// PATCH /api/v1/subscriptions/{id}
///
/// Accepts only `delivery_address`, `meal_preferences` and `auto_renew`.
pub async fn update_subscription(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<SubscriptionPatch>, JsonRejection>,
) -> ApiResult<Json<Subscription>> {
    let Json(patch) = payload?;

    timed("update_subscription", async move {
        let sub = owned(&state, user, &id).await?;
        Ok(Json(state.subscriptions.update_fields(sub.id, patch).await?))
    })
    .await
}

/// POST /api/v1/subscriptions/{id}/pause
pub async fn pause_subscription(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Subscription>> {
    timed("pause_subscription", async move {
        let sub = owned(&state, user, &id).await?;
        Ok(Json(state.subscriptions.pause(sub.id).await?))
    })
    .await
}

/// POST /api/v1/subscriptions/{id}/resume
pub async fn resume_subscription(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Subscription>> {
    timed("resume_subscription", async move {
        let sub = owned(&state, user, &id).await?;
        Ok(Json(state.subscriptions.resume(sub.id).await?))
    })
    .await
}

/// POST /api/v1/subscriptions/{id}/cancel
pub async fn cancel_subscription(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Subscription>> {
    timed("cancel_subscription", async move {
        let sub = owned(&state, user, &id).await?;
        let sub = state.subscriptions.cancel(sub.id).await?;
        metrics::counter!("nourish_subscriptions_cancelled_total").increment(1);
        Ok(Json(sub))
    })
    .await
}

/// Load a subscription the caller owns
async fn owned(state: &AppState, user: CurrentUser, raw_id: &str) -> ApiResult<Subscription> {
    let id = subscription_id(raw_id)?;
    let sub = state
        .subscriptions
        .get(id)
        .await?
        .ok_or(ApiError::SubscriptionNotFound)?;

    if sub.user_id != *user {
        tracing::warn!(
            subscription_id = %sub.id,
            user_id = %*user,
            "Subscription access by non-owner"
        );
        return Err(ApiError::Forbidden("subscription belongs to another user".into()));
    }
    Ok(sub)
}

/// Bounded label set for plan metrics
fn metric_plan_label(plan: &PlanType) -> &'static str {
    match plan {
        PlanType::Daily => "daily",
        PlanType::Weekly => "weekly",
        PlanType::Monthly => "monthly",
        PlanType::Unrecognized(_) => "other",
    }
}
