//! Redis-backed rating tokens

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::{constants::GRADE_TOKEN_KEY_PREFIX, error::AppResult, models::GradeToken};

use super::TokenStore;

/// Tokens stored as JSON under `grade_token:<id>` with a TTL
#[derive(Clone)]
pub struct RedisTokenStore {
    redis: ConnectionManager,
}

impl RedisTokenStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn key(id: Uuid) -> String {
        format!("{}{}", GRADE_TOKEN_KEY_PREFIX, id)
    }

    fn decode(raw: Option<String>) -> AppResult<Option<GradeToken>> {
        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(Into::into)
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn issue(&self, token: &GradeToken, ttl: Duration) -> AppResult<()> {
        let mut redis = self.redis.clone();
        let payload = serde_json::to_string(token)?;
        let seconds = ttl.as_secs().max(1);

        redis
            .set_ex::<_, _, ()>(Self::key(token.id), payload, seconds)
            .await?;

        Ok(())
    }

    async fn peek(&self, id: Uuid) -> AppResult<Option<GradeToken>> {
        let mut redis = self.redis.clone();
        let raw: Option<String> = redis.get(Self::key(id)).await?;
        Self::decode(raw)
    }

    async fn consume(&self, id: Uuid) -> AppResult<Option<GradeToken>> {
        let mut redis = self.redis.clone();
        let raw: Option<String> = redis::cmd("GETDEL")
            .arg(Self::key(id))
            .query_async(&mut redis)
            .await?;
        Self::decode(raw)
    }
}
