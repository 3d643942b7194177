//! Redis remote store implementation

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::info;

use crate::domain::store::{KeyType, RemoteStore};
use crate::domain::DomainError;

/// Configuration for the Redis store
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout
    pub connection_timeout: Duration,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisStoreConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

/// Redis-backed remote store
///
/// Each call clones the `ConnectionManager`, which multiplexes over one
/// connection and reconnects on failure.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    config: RedisStoreConfig,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisStore {
    /// Connects to Redis
    pub async fn new(config: RedisStoreConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::store(format!("Failed to create Redis client: {}", e)))?;

        let connection =
            tokio::time::timeout(config.connection_timeout, ConnectionManager::new(client))
                .await
                .map_err(|_| {
                    DomainError::store(format!(
                        "Timed out connecting to Redis after {:?}",
                        config.connection_timeout
                    ))
                })?
                .map_err(|e| DomainError::store(format!("Failed to connect to Redis: {}", e)))?;

        info!(url = %config.url, prefix = ?config.key_prefix, "Connected to Redis");

        Ok(Self { connection, config })
    }

    fn prefix_key(&self, key: &str) -> String {
        self.config.prefix_key(key)
    }
}

fn op_error(op: &str, key: &str, e: redis::RedisError) -> DomainError {
    if e.code() == Some("WRONGTYPE") {
        return DomainError::wrong_type(key);
    }

    DomainError::store(format!("Failed to {} key '{}': {}", op, key, e))
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.connection.clone();

        let value: Option<String> = conn
            .get(self.prefix_key(key))
            .await
            .map_err(|e| op_error("get", key, e))?;

        Ok(value)
    }

    async fn get_and_replace(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Option<String>, DomainError> {
        let mut conn = self.connection.clone();

        // SET ... GET replaces the value and returns the old one atomically
        let previous: Option<String> = redis::cmd("SET")
            .arg(self.prefix_key(key))
            .arg(value)
            .arg("GET")
            .query_async(&mut conn)
            .await
            .map_err(|e| op_error("replace", key, e))?;

        Ok(previous)
    }

    async fn delete(&self, keys: &[String]) -> Result<usize, DomainError> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connection.clone();
        let prefixed: Vec<String> = keys.iter().map(|key| self.prefix_key(key)).collect();

        let deleted: usize = conn
            .del(&prefixed)
            .await
            .map_err(|e| op_error("delete", &keys.join(", "), e))?;

        Ok(deleted)
    }

    async fn add_set_members(&self, key: &str, members: &[String]) -> Result<usize, DomainError> {
        let mut conn = self.connection.clone();

        let added: usize = conn
            .sadd(self.prefix_key(key), members)
            .await
            .map_err(|e| op_error("add members to", key, e))?;

        Ok(added)
    }

    async fn set_members(&self, key: &str) -> Result<HashSet<String>, DomainError> {
        let mut conn = self.connection.clone();

        let members: HashSet<String> = conn
            .smembers(self.prefix_key(key))
            .await
            .map_err(|e| op_error("read members of", key, e))?;

        Ok(members)
    }

    async fn remove_set_members(
        &self,
        key: &str,
        members: &[String],
    ) -> Result<usize, DomainError> {
        let mut conn = self.connection.clone();

        let removed: usize = conn
            .srem(self.prefix_key(key), members)
            .await
            .map_err(|e| op_error("remove members from", key, e))?;

        Ok(removed)
    }

    async fn set_hash_field(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<usize, DomainError> {
        let mut conn = self.connection.clone();

        let created: usize = conn
            .hset(self.prefix_key(key), field, value)
            .await
            .map_err(|e| op_error("set field on", key, e))?;

        Ok(created)
    }

    async fn get_hash_field(
        &self,
        key: &str,
        field: &str,
    ) -> Result<Option<String>, DomainError> {
        let mut conn = self.connection.clone();

        let value: Option<String> = conn
            .hget(self.prefix_key(key), field)
            .await
            .map_err(|e| op_error("read field of", key, e))?;

        Ok(value)
    }

    async fn get_hash(&self, key: &str) -> Result<HashMap<String, String>, DomainError> {
        let mut conn = self.connection.clone();

        let fields: HashMap<String, String> = conn
            .hgetall(self.prefix_key(key))
            .await
            .map_err(|e| op_error("read hash", key, e))?;

        Ok(fields)
    }

    async fn remove_hash_fields(
        &self,
        key: &str,
        fields: &[String],
    ) -> Result<usize, DomainError> {
        let mut conn = self.connection.clone();

        let removed: usize = conn
            .hdel(self.prefix_key(key), fields)
            .await
            .map_err(|e| op_error("remove fields from", key, e))?;

        Ok(removed)
    }

    async fn key_type(&self, key: &str) -> Result<KeyType, DomainError> {
        let mut conn = self.connection.clone();

        let key_type: String = redis::cmd("TYPE")
            .arg(self.prefix_key(key))
            .query_async(&mut conn)
            .await
            .map_err(|e| op_error("read type of", key, e))?;

        key_type.parse()
    }
}
