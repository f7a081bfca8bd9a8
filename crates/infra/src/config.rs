//! Gateway configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is loaded first when present.
//!
//! # Environment Variables
//!
//! ## Server
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 5000)
//!
//! ## Document store
//! - `STORE_BACKEND` - `mongo` (default) or `memory`
//! - `MONGODB_URI` - Full connection string, or instead:
//! - `DB_USER`, `DB_PASS`, `DB_CLUSTER` - Atlas credentials and cluster host
//! - `DB_NAME` - Database name (default: pipilicaShop)
//!
//! ## Identity provider
//! - `FIREBASE_PROJECT_ID` - Verify Firebase ID tokens for this project, or
//! - `FIREBASE_SERVICE_ACCOUNT` - Service-account JSON; its `project_id` is used
//! - `JWT_SECRET` - Shared HS256 secret (local development only)
//!
//! With the `mongo` backend one of these must be set. The built-in development
//! secret is only accepted together with `STORE_BACKEND=memory`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DB_NAME: &str = "pipilicaShop";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub store: StoreConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub enum StoreConfig {
    Mongo { uri: SecretString, db_name: String },
    InMemory,
}

#[derive(Debug, Clone)]
pub enum AuthConfig {
    Firebase { project_id: String },
    SharedSecret { secret: SecretString, insecure_default: bool },
}

impl AppConfig {
    /// Load configuration from the process environment (and `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = match get("HOST") {
            Some(v) => v
                .parse()
                .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), format!("{e}")))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let port = match get("PORT") {
            Some(v) => v
                .parse()
                .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), format!("{e}")))?,
            None => DEFAULT_PORT,
        };

        let store = match get("STORE_BACKEND").as_deref() {
            None | Some("mongo") => StoreConfig::Mongo {
                uri: mongo_uri(&get)?,
                db_name: get("DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            },
            Some("memory") => StoreConfig::InMemory,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "STORE_BACKEND".to_string(),
                    format!("expected 'mongo' or 'memory', got '{other}'"),
                ));
            }
        };

        let auth = auth_config(&get, &store)?;

        Ok(Self {
            host,
            port,
            store,
            auth,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn mongo_uri(get: &impl Fn(&str) -> Option<String>) -> Result<SecretString, ConfigError> {
    if let Some(uri) = get("MONGODB_URI") {
        return Ok(SecretString::from(uri));
    }

    let user = get("DB_USER").ok_or_else(|| ConfigError::MissingEnvVar("MONGODB_URI".to_string()))?;
    let pass = get("DB_PASS").ok_or_else(|| ConfigError::MissingEnvVar("DB_PASS".to_string()))?;
    let cluster =
        get("DB_CLUSTER").ok_or_else(|| ConfigError::MissingEnvVar("DB_CLUSTER".to_string()))?;

    let mut url = url::Url::parse(&format!(
        "mongodb+srv://{cluster}/?retryWrites=true&w=majority"
    ))
    .map_err(|e| ConfigError::InvalidEnvVar("DB_CLUSTER".to_string(), e.to_string()))?;

    url.set_username(&user)
        .map_err(|()| ConfigError::InvalidEnvVar("DB_USER".to_string(), "cannot be used in a URI".to_string()))?;
    url.set_password(Some(&pass))
        .map_err(|()| ConfigError::InvalidEnvVar("DB_PASS".to_string(), "cannot be used in a URI".to_string()))?;

    Ok(SecretString::from(url.to_string()))
}

fn auth_config(
    get: &impl Fn(&str) -> Option<String>,
    store: &StoreConfig,
) -> Result<AuthConfig, ConfigError> {
    if let Some(project_id) = get("FIREBASE_PROJECT_ID") {
        return Ok(AuthConfig::Firebase { project_id });
    }

    if let Some(raw) = get("FIREBASE_SERVICE_ACCOUNT") {
        let account: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
            ConfigError::InvalidEnvVar("FIREBASE_SERVICE_ACCOUNT".to_string(), e.to_string())
        })?;
        let project_id = account
            .get("project_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "FIREBASE_SERVICE_ACCOUNT".to_string(),
                    "missing project_id".to_string(),
                )
            })?;
        return Ok(AuthConfig::Firebase {
            project_id: project_id.to_string(),
        });
    }

    match (get("JWT_SECRET"), store) {
        (Some(secret), _) => Ok(AuthConfig::SharedSecret {
            secret: SecretString::from(secret),
            insecure_default: false,
        }),
        (None, StoreConfig::InMemory) => Ok(AuthConfig::SharedSecret {
            secret: SecretString::from(DEV_JWT_SECRET.to_string()),
            insecure_default: true,
        }),
        (None, StoreConfig::Mongo { .. }) => {
            Err(ConfigError::MissingEnvVar("FIREBASE_PROJECT_ID".to_string()))
        }
    }
}

impl StoreConfig {
    pub fn describe(&self) -> String {
        match self {
            StoreConfig::Mongo { db_name, .. } => format!("mongo (db={db_name})"),
            StoreConfig::InMemory => "in-memory".to_string(),
        }
    }
}
