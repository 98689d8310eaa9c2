//! Database errors

use thiserror::Error;

/// Partial unique index allowing one `active` subscription per user
pub const ONE_ACTIVE_SUBSCRIPTION_INDEX: &str = "subscriptions_one_active_per_user";

/// Unique index allowing one delivery per order
pub const ONE_DELIVERY_PER_ORDER_INDEX: &str = "deliveries_order_id_key";

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLx error
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),

    /// A unique constraint rejected the write
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Stored data could not be mapped to a domain value
    #[error("corrupt record: {0}")]
    Decode(String),
}

impl DbError {
    /// Whether the failure is infrastructure-level and worth retrying later
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Sqlx(
                sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
                    | sqlx::Error::WorkerCrashed
            )
        )
    }

    /// Whether this is a violation of the named unique index
    pub fn violates(&self, constraint: &str) -> bool {
        matches!(self, Self::UniqueViolation(name) if name == constraint)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::UniqueViolation(db_err.constraint().unwrap_or_default().to_string());
            }
        }
        Self::Sqlx(err)
    }
}

/// Result alias for repository operations
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_are_unavailable() {
        assert!(DbError::from(sqlx::Error::PoolTimedOut).is_unavailable());
        assert!(DbError::from(sqlx::Error::PoolClosed).is_unavailable());
        assert!(!DbError::from(sqlx::Error::RowNotFound).is_unavailable());
        assert!(!DbError::Decode("bad status".into()).is_unavailable());
    }

    #[test]
    fn violation_matches_constraint_name() {
        let err = DbError::UniqueViolation(ONE_ACTIVE_SUBSCRIPTION_INDEX.to_string());
        assert!(err.violates(ONE_ACTIVE_SUBSCRIPTION_INDEX));
        assert!(!err.violates(ONE_DELIVERY_PER_ORDER_INDEX));
    }
}
