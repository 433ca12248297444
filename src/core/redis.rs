use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::{cmd, Client, RedisError};
use tokio::sync::RwLock;

const REVOKED_TOKEN_PREFIX: &str = "revoked";

#[derive(Clone)]
pub(crate) struct RedisHandle {
    url: String,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
}

/// Outcome of a revocation lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RevocationLookup {
    Revoked,
    Active,
    /// No connection was ever established.
    Disconnected,
    Failed(String),
}

#[derive(Debug, Clone)]
pub(crate) enum RedisHealth {
    Healthy,
    Disconnected,
    Unhealthy(String),
}

impl RedisHandle {
    pub(crate) fn new(url: String) -> Self {
        Self { url, manager: Arc::new(RwLock::new(None)) }
    }

    pub(crate) async fn connect(&self) -> Result<(), RedisError> {
        let client = Client::open(self.url.clone())?;
        let manager = ConnectionManager::new(client).await?;
        let mut guard = self.manager.write().await;
        *guard = Some(manager);
        Ok(())
    }

    pub(crate) async fn disconnect(&self) {
        let mut guard = self.manager.write().await;
        *guard = None;
    }

    async fn manager(&self) -> Option<ConnectionManager> {
        self.manager.read().await.clone()
    }

    pub(crate) async fn health(&self) -> RedisHealth {
        let Some(mut manager) = self.manager().await else {
            return RedisHealth::Disconnected;
        };

        match cmd("PING").query_async::<_, String>(&mut manager).await {
            Ok(_) => RedisHealth::Healthy,
            Err(err) => RedisHealth::Unhealthy(err.to_string()),
        }
    }

    /// Fixed-window counter. Without a connection every request is allowed.
    pub(crate) async fn rate_limit(
        &self,
        key: &str,
        limit: u64,
        window_seconds: u64,
    ) -> Result<bool, RedisError> {
        let Some(mut manager) = self.manager().await else {
            return Ok(true);
        };

        let script = redis::Script::new(
            r#"
            local current = redis.call("INCR", KEYS[1])
            if current == 1 then
                redis.call("EXPIRE", KEYS[1], ARGV[1])
            end
            return current
        "#,
        );

        let current: i64 =
            script.key(key).arg(window_seconds as i64).invoke_async(&mut manager).await?;

        Ok(current <= limit as i64)
    }

    /// Marks a token id as revoked until the token would have expired anyway.
    pub(crate) async fn revoke_token(
        &self,
        token_id: &str,
        ttl_seconds: u64,
    ) -> Result<(), RedisError> {
        let Some(mut manager) = self.manager().await else {
            tracing::warn!(token_id, "Redis unavailable; token revocation not persisted");
            return Ok(());
        };

        cmd("SET")
            .arg(revoked_key(token_id))
            .arg(1)
            .arg("EX")
            .arg(ttl_seconds.max(1))
            .query_async::<_, ()>(&mut manager)
            .await
    }

    pub(crate) async fn revocation_lookup(&self, token_id: &str) -> RevocationLookup {
        let Some(mut manager) = self.manager().await else {
            return RevocationLookup::Disconnected;
        };

        match cmd("EXISTS").arg(revoked_key(token_id)).query_async::<_, i64>(&mut manager).await {
            Ok(exists) if exists > 0 => RevocationLookup::Revoked,
            Ok(_) => RevocationLookup::Active,
            Err(err) => RevocationLookup::Failed(err.to_string()),
        }
    }
}

fn revoked_key(token_id: &str) -> String {
    format!("{REVOKED_TOKEN_PREFIX}:{token_id}")
}

#[cfg(test)]
mod tests {
    use super::{revoked_key, RedisHandle, RevocationLookup};
    use crate::core::config::Settings;
    use crate::test_support;
    use uuid::Uuid;

    #[test]
    fn revoked_keys_are_namespaced() {
        assert_eq!(revoked_key("abc"), "revoked:abc");
    }

    #[tokio::test]
    async fn disconnected_handle_is_permissive() {
        let redis = RedisHandle::new("redis://127.0.0.1:1/0".to_string());

        assert!(redis.rate_limit("rl:test", 0, 5).await.expect("rate limit"));
        assert_eq!(redis.revocation_lookup("jti").await, RevocationLookup::Disconnected);
        redis.revoke_token("jti", 10).await.expect("revoke without connection");
    }

    #[tokio::test]
    async fn revoked_token_is_reported() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        if test_support::reset_redis(settings.redis().redis_url()).await.is_err() {
            eprintln!("skipping: test Redis is unreachable");
            return;
        }

        let redis = RedisHandle::new(settings.redis().redis_url());
        redis.connect().await.expect("redis connect");

        let token_id = Uuid::new_v4().to_string();
        assert_eq!(redis.revocation_lookup(&token_id).await, RevocationLookup::Active);
        redis.revoke_token(&token_id, 30).await.expect("revoke");
        assert_eq!(redis.revocation_lookup(&token_id).await, RevocationLookup::Revoked);
    }

    #[tokio::test]
    async fn rate_limit_enforces_limit() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        if test_support::reset_redis(settings.redis().redis_url()).await.is_err() {
            eprintln!("skipping: test Redis is unreachable");
            return;
        }

        let redis = RedisHandle::new(settings.redis().redis_url());
        redis.connect().await.expect("redis connect");

        let key = format!("rate-limit:{}", Uuid::new_v4());
        assert!(redis.rate_limit(&key, 1, 5).await.expect("rate limit"));
        assert!(!redis.rate_limit(&key, 1, 5).await.expect("rate limit"));
    }
}
