//! Request extractors
//!
//! The upstream identity gateway verifies the caller and forwards the user id
//! in `x-user-id`. Requests without a well-formed id are rejected.

use std::ops::Deref;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use nourish_types::UserId;

use crate::error::ApiError;

/// Header carrying the verified caller id
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor for the calling user
///
/// Returns 401 if the header is absent or not a valid id.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

impl Deref for CurrentUser {
    type Target = UserId;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| UserId::parse(raw).ok())
            .map(Self)
            .ok_or(ApiError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<CurrentUser, ApiError> {
        let mut builder = Request::builder().uri("/api/v1/subscriptions");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        CurrentUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_valid_header() {
        let id = UserId::new();
        let user = extract(Some(&id.to_string())).await.unwrap();
        assert_eq!(*user, id);
    }

    #[tokio::test]
    async fn test_missing_header() {
        assert!(matches!(extract(None).await, Err(ApiError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_malformed_header() {
        assert!(matches!(
            extract(Some("user-123")).await,
            Err(ApiError::Unauthenticated)
        ));
    }
}
