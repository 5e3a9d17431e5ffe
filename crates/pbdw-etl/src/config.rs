//! Configuration management
//!
//! Defaults match the reference docker-compose deployment (services named
//! `postgres` and `mongodb`, CSVs mounted under `input/`). Every value can be
//! overridden from the environment or a `.env` file.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EtlError, EtlResult};

// ============================================================================
// Configuration Constants
// ============================================================================

pub const DEFAULT_POSTGRES_HOST: &str = "postgres";
pub const DEFAULT_POSTGRES_PORT: u16 = 5432;
pub const DEFAULT_POSTGRES_DB: &str = "pb_dw";
pub const DEFAULT_POSTGRES_USER: &str = "postgres";
pub const DEFAULT_POSTGRES_PASSWORD: &str = "postgres";

pub const DEFAULT_MONGO_HOST: &str = "mongodb";
pub const DEFAULT_MONGO_PORT: u16 = 27017;
pub const DEFAULT_MONGO_DB: &str = "admin";
pub const DEFAULT_MONGO_COLLECTION: &str = "order_reviews";

/// Directory holding the five source CSV files.
pub const DEFAULT_INPUT_DIR: &str = "input";

/// Rows per multi-row INSERT statement.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// PostgreSQL accepts at most this many bind parameters per statement.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Columns in the widest table we insert into (the fact table).
pub const WIDEST_ROW: usize = 7;

pub const CUSTOMERS_FILE: &str = "olist_customers_dataset.csv";
pub const ORDERS_FILE: &str = "olist_orders_dataset.csv";
pub const ORDER_ITEMS_FILE: &str = "olist_order_items_dataset.csv";
pub const ORDER_PAYMENTS_FILE: &str = "olist_order_payments_dataset.csv";
pub const PRODUCTS_FILE: &str = "olist_products_dataset.csv";

/// ETL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub postgres: PostgresConfig,
    pub mongo: MongoConfig,
    pub input: InputConfig,
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub collection: String,
}

/// Locations of the flat source files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub dir: PathBuf,
}

impl InputConfig {
    pub fn customers(&self) -> PathBuf {
        self.dir.join(CUSTOMERS_FILE)
    }

    pub fn orders(&self) -> PathBuf {
        self.dir.join(ORDERS_FILE)
    }

    pub fn order_items(&self) -> PathBuf {
        self.dir.join(ORDER_ITEMS_FILE)
    }

    pub fn order_payments(&self) -> PathBuf {
        self.dir.join(ORDER_PAYMENTS_FILE)
    }

    pub fn products(&self) -> PathBuf {
        self.dir.join(PRODUCTS_FILE)
    }
}

impl PostgresConfig {
    /// `host:port/database`, safe to log
    pub fn address(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

impl MongoConfig {
    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}", self.host, self.port)
    }

    /// `host:port/database.collection`, safe to log
    pub fn address(&self) -> String {
        format!("{}:{}/{}.{}", self.host, self.port, self.database, self.collection)
    }
}

impl Config {
    /// Load configuration from `.env`, the environment and defaults
    pub fn load() -> EtlResult<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_vars(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> EtlResult<Self> {
        let text = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            postgres: PostgresConfig {
                host: text("POSTGRES_HOST", DEFAULT_POSTGRES_HOST),
                port: parsed(&var, "POSTGRES_PORT", DEFAULT_POSTGRES_PORT)?,
                database: text("POSTGRES_DB", DEFAULT_POSTGRES_DB),
                user: text("POSTGRES_USER", DEFAULT_POSTGRES_USER),
                password: text("POSTGRES_PASSWORD", DEFAULT_POSTGRES_PASSWORD),
            },
            mongo: MongoConfig {
                host: text("MONGO_HOST", DEFAULT_MONGO_HOST),
                port: parsed(&var, "MONGO_PORT", DEFAULT_MONGO_PORT)?,
                database: text("MONGO_DB", DEFAULT_MONGO_DB),
                collection: text("MONGO_COLLECTION", DEFAULT_MONGO_COLLECTION),
            },
            input: InputConfig {
                dir: PathBuf::from(text("ETL_INPUT_DIR", DEFAULT_INPUT_DIR)),
            },
            batch_size: parsed(&var, "ETL_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> EtlResult<()> {
        if self.postgres.host.is_empty() || self.postgres.database.is_empty() {
            return Err(EtlError::config("PostgreSQL host and database cannot be empty"));
        }

        if self.postgres.port == 0 || self.mongo.port == 0 {
            return Err(EtlError::config("Ports must be greater than 0"));
        }

        if self.mongo.host.is_empty()
            || self.mongo.database.is_empty()
            || self.mongo.collection.is_empty()
        {
            return Err(EtlError::config(
                "MongoDB host, database and collection cannot be empty",
            ));
        }

        let max_batch = MAX_BIND_PARAMS / WIDEST_ROW;
        if self.batch_size == 0 || self.batch_size > max_batch {
            return Err(EtlError::config(format!(
                "Batch size must be between 1 and {}, got {}",
                max_batch, self.batch_size
            )));
        }

        Ok(())
    }

    /// Point the extractors at another directory
    pub fn with_input_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.input.dir = dir.as_ref().to_path_buf();
        self
    }
}

/// Numeric setting; unset means the default, set but unparsable is an error
fn parsed<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> EtlResult<T> {
    match var(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            EtlError::config(format!("{} must be a number, got '{}'", key, raw))
        }),
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            postgres: PostgresConfig {
                host: DEFAULT_POSTGRES_HOST.to_string(),
                port: DEFAULT_POSTGRES_PORT,
                database: DEFAULT_POSTGRES_DB.to_string(),
                user: DEFAULT_POSTGRES_USER.to_string(),
                password: DEFAULT_POSTGRES_PASSWORD.to_string(),
            },
            mongo: MongoConfig {
                host: DEFAULT_MONGO_HOST.to_string(),
                port: DEFAULT_MONGO_PORT,
                database: DEFAULT_MONGO_DB.to_string(),
                collection: DEFAULT_MONGO_COLLECTION.to_string(),
            },
            input: InputConfig {
                dir: PathBuf::from(DEFAULT_INPUT_DIR),
            },
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}
