use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

const DEFAULT_QUEUE_SIZE: usize = 1024;

#[derive(Debug, Clone)]
pub struct InventoryConfig {
    pub common: core_config::Config,
    pub otlp_endpoint: Option<String>,
    pub store: StoreConfig,
    pub identity: IdentityConfig,
    pub hooks: HookConfig,
    pub genai: GenaiConfig,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub mongodb: Option<MongoConfig>,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

/// Where the identity verifier gets its key material from.
#[derive(Debug, Clone)]
pub enum IdentityKey {
    /// RS256 public key in PEM form, read from disk.
    PublicKeyPath(String),
    /// HS256 shared secret.
    SharedSecret(Secret<String>),
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub key: IdentityKey,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HookConfig {
    pub signing_secret: Option<Secret<String>>,
    pub queue_size: usize,
}

#[derive(Debug, Clone)]
pub struct GenaiConfig {
    /// Absent key leaves the client unconfigured.
    pub api_key: Option<Secret<String>>,
    pub model: String,
}

impl InventoryConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let backend: StoreBackend = get_env("STORE_BACKEND", Some("mongo"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let mongodb = match backend {
            StoreBackend::Mongo => Some(MongoConfig {
                uri: get_env("MONGODB_URI", None, is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("cards_db"), is_prod)?,
            }),
            StoreBackend::Memory => None,
        };

        let key = match (
            optional_env("IDENTITY_PUBLIC_KEY_PATH"),
            optional_env("IDENTITY_SHARED_SECRET"),
        ) {
            (Some(path), _) => IdentityKey::PublicKeyPath(path),
            (None, Some(secret)) => IdentityKey::SharedSecret(Secret::new(secret)),
            (None, None) => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "IDENTITY_PUBLIC_KEY_PATH or IDENTITY_SHARED_SECRET must be set"
                )))
            }
        };

        Ok(InventoryConfig {
            common: common_config,
            otlp_endpoint: optional_env("OTLP_ENDPOINT"),
            store: StoreConfig { backend, mongodb },
            identity: IdentityConfig {
                key,
                issuer: optional_env("IDENTITY_ISSUER"),
                audience: optional_env("IDENTITY_AUDIENCE"),
            },
            hooks: HookConfig {
                signing_secret: hook_signing_secret(optional_env("HOOK_SIGNING_SECRET"), is_prod)?,
                queue_size: parse_queue_size(optional_env("PROVISIONER_QUEUE_SIZE").as_deref())?,
            },
            genai: GenaiConfig {
                api_key: optional_env("GEMINI_API_KEY").map(Secret::new),
                model: get_env("GENAI_MODEL", Some("gemini-2.0-flash"), false)?,
            },
        })
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

fn parse_queue_size(raw: Option<&str>) -> Result<usize, AppError> {
    match raw {
        None => Ok(DEFAULT_QUEUE_SIZE),
        Some(value) => match value.parse::<usize>() {
            Ok(size) if size > 0 => Ok(size),
            _ => Err(AppError::ConfigError(anyhow::anyhow!(
                "PROVISIONER_QUEUE_SIZE must be a positive integer, got {:?}",
                value
            ))),
        },
    }
}

/// Production refuses to expose the user-created hook unauthenticated.
fn hook_signing_secret(
    raw: Option<String>,
    is_prod: bool,
) -> Result<Option<Secret<String>>, AppError> {
    match raw {
        Some(secret) => Ok(Some(Secret::new(secret))),
        None if is_prod => Err(AppError::ConfigError(anyhow::anyhow!(
            "HOOK_SIGNING_SECRET is required in production but not set"
        ))),
        None => Ok(None),
    }
}

/// Set and non-empty, or `None`.
fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
