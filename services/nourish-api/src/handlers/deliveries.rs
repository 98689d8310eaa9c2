//! Delivery handlers
//!
//! Reads are scoped to the calling user. Status and tracking writes come from
//! courier devices and dispatch, and are not owner-checked here.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use nourish_core::NewDelivery;
use nourish_types::{
    Address, Delivery, DeliveryPersonId, DeliveryStatus, GeoPoint, OrderId, TrackingInfo,
};
use serde::Deserialize;

use super::shared::{delivery_id, order_id, timed};
use crate::error::{ApiError, ApiResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateDeliveryRequest {
    pub order_id: OrderId,
    pub delivery_person_id: DeliveryPersonId,
    pub delivery_address: Address,
    #[serde(default)]
    pub tracking_info: TrackingInfo,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: DeliveryStatus,
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub route: Vec<GeoPoint>,
}

#[derive(Debug, Deserialize)]
pub struct EtaRequest {
    pub estimated_time_remaining: u32,
    pub distance_remaining: f64,
}

#[derive(Debug, Deserialize)]
pub struct EstimatedTimeRequest {
    pub estimated_delivery_time: DateTime<Utc>,
}

// ============================================================================
// Creation and Reads
// ============================================================================

/// POST /api/v1/deliveries
pub async fn create_delivery(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<CreateDeliveryRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Delivery>)> {
    let Json(req) = payload?;

    timed("create_delivery", async move {
        let delivery = state
            .deliveries
            .create(NewDelivery {
                order_id: req.order_id,
                user_id: *user,
                delivery_person_id: req.delivery_person_id,
                delivery_address: req.delivery_address,
                tracking_info: req.tracking_info,
            })
            .await?;
        metrics::counter!("nourish_deliveries_created_total").increment(1);
        Ok((StatusCode::CREATED, Json(delivery)))
    })
    .await
}

/// GET /api/v1/deliveries?limit=
pub async fn list_deliveries(
    State(state): State<AppState>,
    user: CurrentUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Delivery>>> {
    let Query(query) = query?;

    timed("list_deliveries", async move {
        Ok(Json(state.deliveries.list_by_user(*user, query.limit).await?))
    })
    .await
}

/// GET /api/v1/deliveries/active
///
/// `null` when nothing is in flight.
pub async fn get_active_delivery(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Option<Delivery>>> {
    timed("get_active_delivery", async move {
        Ok(Json(state.deliveries.get_active_for_user(*user).await?))
    })
    .await
}

/// GET /api/v1/deliveries/{id}
pub async fn get_delivery(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Delivery>> {
    timed("get_delivery", async move {
        let delivery = state
            .deliveries
            .find_by_raw_id(&id)
            .await?
            .ok_or(ApiError::DeliveryNotFound)?;
        Ok(Json(check_owner(delivery, user)?))
    })
    .await
}

/// GET /api/v1/deliveries/by-order/{order_id}
pub async fn get_delivery_by_order(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(raw_order_id): Path<String>,
) -> ApiResult<Json<Delivery>> {
    timed("get_delivery_by_order", async move {
        let delivery = state
            .deliveries
            .get_by_order(order_id(&raw_order_id)?)
            .await?
            .ok_or(ApiError::DeliveryNotFound)?;
        Ok(Json(check_owner(delivery, user)?))
    })
    .await
}

// ============================================================================
// Writes
// ============================================================================

/// POST /api/v1/deliveries/{id}/status
pub async fn advance_delivery_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<Json<Delivery>> {
    let Json(req) = payload?;

    timed("advance_delivery_status", async move {
        let delivery = state
            .deliveries
            .advance_status(delivery_id(&id)?, req.status)
            .await?;
        metrics::counter!(
            "nourish_delivery_status_changes_total",
            "status" => req.status.as_str()
        )
        .increment(1);
        Ok(Json(delivery))
    })
    .await
}

/// PUT /api/v1/deliveries/{id}/tracking/location
pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<GeoPoint>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(location) = payload?;

    timed("update_location", async move {
        state
            .deliveries
            .update_location(delivery_id(&id)?, location)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    })
    .await
}

/// PUT /api/v1/deliveries/{id}/tracking/route
pub async fn update_route(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(req) = payload?;

    timed("update_route", async move {
        state
            .deliveries
            .update_route(delivery_id(&id)?, req.route)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    })
    .await
}

/// PUT /api/v1/deliveries/{id}/tracking/eta
pub async fn update_eta(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<EtaRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(req) = payload?;

    timed("update_eta", async move {
        state
            .deliveries
            .update_eta(
                delivery_id(&id)?,
                req.estimated_time_remaining,
                req.distance_remaining,
            )
            .await?;
        Ok(StatusCode::NO_CONTENT)
    })
    .await
}

/// PUT /api/v1/deliveries/{id}/tracking
pub async fn replace_tracking(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TrackingInfo>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(tracking) = payload?;

    timed("replace_tracking", async move {
        state
            .deliveries
            .replace_tracking(delivery_id(&id)?, tracking)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    })
    .await
}

/// PUT /api/v1/deliveries/{id}/estimated-time
pub async fn set_estimated_time(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<EstimatedTimeRequest>, JsonRejection>,
) -> ApiResult<StatusCode> {
    let Json(req) = payload?;

    timed("set_estimated_time", async move {
        state
            .deliveries
            .set_estimated_delivery_time(delivery_id(&id)?, req.estimated_delivery_time)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    })
    .await
}

fn check_owner(delivery: Delivery, user: CurrentUser) -> ApiResult<Delivery> {
    if delivery.user_id != *user {
        tracing::warn!(
            delivery_id = %delivery.id,
            user_id = %*user,
            "Delivery access by non-owner"
        );
        return Err(ApiError::Forbidden("access denied".into()));
    }
    Ok(delivery)
}
