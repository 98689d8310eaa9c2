//! NourishNet DB - Persistent record store boundary
//!
//! Repository traits consumed by the engines, the row models they exchange,
//! and SQLx-backed PostgreSQL implementations.
//!
//! # Example
//!
//! ```rust,ignore
//! use nourish_db::{create_pool, run_migrations, Repositories};
//!
//! let pool = create_pool("postgres://localhost/nourishnet").await?;
//! run_migrations(&pool).await?;
//! let repos = Repositories::new(pool);
//!
//! let active = repos.subscriptions.find_active_by_user_id(user_id).await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{create_pool, create_pool_with_options, run_migrations, DbPool, PoolOptions};
pub use repo::*;

// Re-exported so callers can match on driver errors without a direct dependency
pub use sqlx;
