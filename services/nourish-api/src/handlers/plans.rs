//! Plan catalog handler

use axum::Json;
use nourish_types::{catalog, PlanOffer};

/// GET /api/v1/plans
pub async fn list_plans() -> Json<Vec<PlanOffer>> {
    Json(catalog())
}
