//! Maps a bearer token to the signed-in user.
//!
//! Sign-in itself happens in the external auth service, which writes
//! `session:<token> -> <user uuid>` into Redis. This module only reads it.

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use redis::AsyncCommands;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

const SESSION_KEY_PREFIX: &str = "session:";

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the user behind `token`, or `None` for unknown/expired sessions.
    async fn resolve(&self, token: &str) -> Result<Option<Uuid>>;
}

pub struct RedisSessionStore {
    client: redis::Client,
}

impl RedisSessionStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn resolve(&self, token: &str) -> Result<Option<Uuid>> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .context("Redis connection failed")?;

        let value: Option<String> = conn
            .get(format!("{SESSION_KEY_PREFIX}{token}"))
            .await
            .context("Redis session lookup failed")?;

        // A malformed value is treated as no session rather than a server error.
        Ok(value.and_then(|v| Uuid::parse_str(v.trim()).ok()))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The authenticated caller. Rejects with 401 before the handler body runs.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        match state.sessions.resolve(token).await? {
            Some(user_id) => Ok(AuthUser(user_id)),
            None => Err(AppError::Unauthorized),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);
    }
}
