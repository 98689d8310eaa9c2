//! PostgreSQL subscription repository implementation

use async_trait::async_trait;
use nourish_types::{SubscriptionPatch, SubscriptionStatus};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::SubscriptionRow;
use crate::repo::{CreateSubscription, SubscriptionRepository};

const COLUMNS: &str = "id, user_id, plan_type, status, start_date, end_date, price_minor, \
                       currency, delivery_address, meal_preferences, next_billing_date, \
                       auto_renew, created_at, updated_at";

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sql = format!("SELECT {COLUMNS} FROM subscriptions WHERE id = $1");
        let sub = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sub)
    }

    async fn find_active_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM subscriptions \
             WHERE user_id = $1 AND status = 'active' \
             ORDER BY created_at DESC \
             LIMIT 1"
        );
        let sub = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sub)
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<SubscriptionRow>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM subscriptions \
             WHERE user_id = $1 \
             ORDER BY created_at DESC"
        );
        let subs = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(subs)
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        let sql = format!(
            "INSERT INTO subscriptions (id, user_id, plan_type, status, start_date, end_date, \
                                        price_minor, currency, delivery_address, \
                                        meal_preferences, next_billing_date, auto_renew) \
             VALUES ($1, $2, $3, 'active', $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(sub.id)
            .bind(sub.user_id)
            .bind(&sub.plan_type)
            .bind(sub.start_date)
            .bind(sub.end_date)
            .bind(sub.price_minor)
            .bind(&sub.currency)
            .bind(Json(&sub.delivery_address))
            .bind(Json(&sub.meal_preferences))
            .bind(sub.next_billing_date)
            .bind(sub.auto_renew)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: SubscriptionStatus,
        to: SubscriptionStatus,
    ) -> DbResult<Option<SubscriptionRow>> {
        let sql = format!(
            "UPDATE subscriptions SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn update_fields(
        &self,
        id: Uuid,
        patch: &SubscriptionPatch,
    ) -> DbResult<Option<SubscriptionRow>> {
        let sql = format!(
            "UPDATE subscriptions SET \
                 delivery_address = COALESCE($2, delivery_address), \
                 meal_preferences = COALESCE($3, meal_preferences), \
                 auto_renew = COALESCE($4, auto_renew), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, SubscriptionRow>(&sql)
            .bind(id)
            .bind(patch.delivery_address.as_ref().map(Json))
            .bind(patch.meal_preferences.as_ref().map(Json))
            .bind(patch.auto_renew)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }
}
