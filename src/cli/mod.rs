//! CLI module for the typed cache
//!
//! Every subcommand maps to one cache operation. `shell` keeps a single
//! cache instance alive and runs one command per stdin line, so repeated
//! reads are served from the local mirror.

pub mod shell;

use std::collections::BTreeMap;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::{DomainError, TypedCache};
use crate::infrastructure::logging;
use crate::infrastructure::store::{StoreFactory, StoreType};

/// Typed cache - write-through local mirror of a Redis-style store
#[derive(Parser, Debug)]
#[command(name = "typed-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Store backend (in_memory or redis), overrides configuration
    #[arg(long, global = true)]
    pub backend: Option<StoreType>,

    /// Redis URL, overrides configuration
    #[arg(long, global = true, env = "REDIS_URL")]
    pub url: Option<String>,

    /// Key prefix, overrides configuration
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Read a scalar value
    Get { key: String },

    /// Write a scalar value, printing the previous one
    Set { key: String, value: String },

    /// Add members to a set, printing how many were new
    Sadd {
        key: String,
        #[arg(required = true)]
        members: Vec<String>,
    },

    /// Read all members of a set
    Smembers { key: String },

    /// Set a hash field, printing 1 if it was created
    Hset {
        key: String,
        field: String,
        value: String,
    },

    /// Read one hash field
    Hget { key: String, field: String },

    /// Read every field of a hash
    Hgetall { key: String },

    /// Delete a key, or only the given set members / hash fields
    Del { key: String, values: Vec<String> },

    /// Read commands from stdin, one per line, through one cache instance
    Shell,
}

/// Runs the CLI
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let loaded = AppConfig::load();
    let mut config = loaded.as_ref().cloned().unwrap_or_default();
    apply_overrides(&mut config, &cli);

    logging::init_logging(&(&config.logging).into());

    if let Err(e) = &loaded {
        warn!(error = %e, "Failed to load configuration, using defaults");
    }

    let store = StoreFactory::new()
        .create(&config.store.to_store_config())
        .await?;
    info!(backend = %config.store.backend, "Store ready");

    let mut cache = TypedCache::new(store);

    match cli.command {
        Command::Shell => shell::run(&mut cache).await,
        command => {
            let output = execute(&mut cache, &command).await?;
            println!("{}", output);
            Ok(())
        }
    }
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(backend) = &cli.backend {
        config.store.backend = backend.clone();
    }

    if let Some(url) = &cli.url {
        config.store.url = url.clone();
    }

    if let Some(prefix) = &cli.prefix {
        config.store.key_prefix = Some(prefix.clone());
    }
}

/// Executes one command against the cache, returning its result as JSON
///
/// Absence is `null`; sets print as a sorted array and hashes as an object.
pub async fn execute(cache: &mut TypedCache, command: &Command) -> Result<Value, DomainError> {
    let output = match command {
        Command::Get { key } => json!(cache.get_scalar(key).await?),
        Command::Set { key, value } => json!(cache.set_scalar(key, value).await?),
        Command::Sadd { key, members } => {
            json!(cache.add_set_members(key, members.iter().cloned()).await?)
        }
        Command::Smembers { key } => json!(cache.get_set(key).await?.map(|members| {
            let mut members: Vec<String> = members.into_iter().collect();
            members.sort();
            members
        })),
        Command::Hset { key, field, value } => {
            json!(cache.set_hash_field(key, field, value).await?)
        }
        Command::Hget { key, field } => json!(cache.get_hash_field(key, field).await?),
        Command::Hgetall { key } => json!(cache
            .get_hash(key)
            .await?
            .map(|fields| fields.into_iter().collect::<BTreeMap<_, _>>())),
        Command::Del { key, values } => json!(cache.delete(key, values.iter().cloned()).await?),
        Command::Shell => {
            return Err(DomainError::configuration(
                "shell cannot be started from inside a shell",
            ))
        }
    };

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::store::InMemoryStore;
    use std::sync::Arc;

    fn cache() -> TypedCache {
        TypedCache::new(Arc::new(InMemoryStore::new()))
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::parse_from(["typed-cache", "sadd", "tags", "a", "b"]);
        assert_eq!(
            cli.command,
            Command::Sadd {
                key: "tags".to_string(),
                members: vec!["a".to_string(), "b".to_string()],
            }
        );

        let cli = Cli::parse_from(["typed-cache", "del", "tags"]);
        assert_eq!(
            cli.command,
            Command::Del {
                key: "tags".to_string(),
                values: vec![],
            }
        );
    }

    #[test]
    fn test_parse_global_overrides() {
        let cli = Cli::parse_from([
            "typed-cache",
            "get",
            "key",
            "--backend",
            "redis",
            "--prefix",
            "app",
        ]);

        assert_eq!(cli.backend, Some(StoreType::Redis));
        assert_eq!(cli.prefix, Some("app".to_string()));
    }

    #[test]
    fn test_sadd_requires_members() {
        let result = Cli::try_parse_from(["typed-cache", "sadd", "tags"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let cli = Cli::parse_from([
            "typed-cache",
            "shell",
            "--backend",
            "redis",
            "--url",
            "redis://cache:6379",
        ]);
        let mut config = AppConfig::default();

        apply_overrides(&mut config, &cli);

        assert_eq!(config.store.backend, StoreType::Redis);
        assert_eq!(config.store.url, "redis://cache:6379");
        assert!(config.store.key_prefix.is_none());
    }

    #[tokio::test]
    async fn test_execute_outputs() {
        let mut cache = cache();

        let set = Command::Set {
            key: "k".to_string(),
            value: "v".to_string(),
        };
        assert_eq!(execute(&mut cache, &set).await.unwrap(), Value::Null);

        let get = Command::Get {
            key: "k".to_string(),
        };
        assert_eq!(execute(&mut cache, &get).await.unwrap(), json!("v"));

        let sadd = Command::Sadd {
            key: "s".to_string(),
            members: vec!["b".to_string(), "a".to_string()],
        };
        assert_eq!(execute(&mut cache, &sadd).await.unwrap(), json!(2));

        let smembers = Command::Smembers {
            key: "s".to_string(),
        };
        assert_eq!(
            execute(&mut cache, &smembers).await.unwrap(),
            json!(["a", "b"])
        );

        let hset = Command::Hset {
            key: "h".to_string(),
            field: "f".to_string(),
            value: "1".to_string(),
        };
        assert_eq!(execute(&mut cache, &hset).await.unwrap(), json!(1));

        let hgetall = Command::Hgetall {
            key: "h".to_string(),
        };
        assert_eq!(
            execute(&mut cache, &hgetall).await.unwrap(),
            json!({ "f": "1" })
        );

        let del = Command::Del {
            key: "s".to_string(),
            values: vec!["a".to_string()],
        };
        assert_eq!(execute(&mut cache, &del).await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn test_execute_rejects_nested_shell() {
        let mut cache = cache();

        let result = execute(&mut cache, &Command::Shell).await;
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }
}
