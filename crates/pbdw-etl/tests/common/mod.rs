//! Shared helpers for warehouse integration tests
//!
//! Containers are started per test and dropped at the end of it, so every
//! test sees an empty warehouse.
//!
//! These tests require Docker:
//!
//! ```bash
//! cargo test -p pbdw-etl -- --ignored --nocapture
//! ```

#![allow(dead_code)]

use std::path::Path;

use anyhow::{Context, Result};
use mongodb::{
    bson::{doc, Document},
    Client,
};
use pbdw_etl::config::{
    Config, CUSTOMERS_FILE, ORDERS_FILE, ORDER_ITEMS_FILE, ORDER_PAYMENTS_FILE, PRODUCTS_FILE,
};
use sqlx::{postgres::PgConnectOptions, Connection, PgConnection};
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::{mongo::Mongo, postgres::Postgres};
use tracing::info;

pub fn init_test_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,pbdw_etl=debug,sqlx=warn,mongodb=warn,testcontainers=info")
        }))
        .with_test_writer()
        .try_init();
}

// ============================================================================
// PostgreSQL Test Container
// ============================================================================

pub struct TestPostgres {
    _container: ContainerAsync<Postgres>,
    pub host: String,
    pub port: u16,
}

impl TestPostgres {
    pub async fn start() -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .with_tag("16-alpine")
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;
        let host = container.get_host().await?.to_string();
        let port = container.get_host_port_ipv4(5432.tcp()).await?;

        Ok(Self {
            _container: container,
            host,
            port,
        })
    }

    pub async fn connect(&self) -> Result<PgConnection> {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database("postgres")
            .username("postgres")
            .password("postgres");
        PgConnection::connect_with(&options)
            .await
            .context("Failed to connect to PostgreSQL")
    }

    pub fn apply_to(&self, config: &mut Config) {
        config.postgres.host = self.host.clone();
        config.postgres.port = self.port;
        config.postgres.database = "postgres".to_string();
        config.postgres.user = "postgres".to_string();
        config.postgres.password = "postgres".to_string();
    }
}

// ============================================================================
// MongoDB Test Container
// ============================================================================

pub const REVIEW_DB: &str = "olist";
pub const REVIEW_COLLECTION: &str = "order_reviews";

pub struct TestMongo {
    _container: ContainerAsync<Mongo>,
    pub host: String,
    pub port: u16,
}

impl TestMongo {
    pub async fn start() -> Result<Self> {
        info!("Starting MongoDB test container...");

        let container = Mongo::default()
            .start()
            .await
            .context("Failed to start MongoDB container")?;
        let host = container.get_host().await?.to_string();
        let port = container.get_host_port_ipv4(27017.tcp()).await?;

        Ok(Self {
            _container: container,
            host,
            port,
        })
    }

    /// Insert raw review documents in the given order
    pub async fn insert_reviews(&self, documents: Vec<Document>) -> Result<()> {
        let client = Client::with_uri_str(format!("mongodb://{}:{}", self.host, self.port)).await?;
        client
            .database(REVIEW_DB)
            .collection::<Document>(REVIEW_COLLECTION)
            .insert_many(documents)
            .await?;
        Ok(())
    }

    pub fn apply_to(&self, config: &mut Config) {
        config.mongo.host = self.host.clone();
        config.mongo.port = self.port;
        config.mongo.database = REVIEW_DB.to_string();
        config.mongo.collection = REVIEW_COLLECTION.to_string();
    }
}

pub fn review(review_id: &str, order_id: &str, score: i32) -> Document {
    doc! { "review_id": review_id, "order_id": order_id, "review_score": score }
}

// ============================================================================
// CSV Fixtures
// ============================================================================

/// A small Olist-shaped data set
///
/// - o1: two items (p1, p2), two payments summing to 80.00
/// - o2: one item, paid with a voucher in 1 installment
/// - o3: one item, no payment record
/// - o4: no items
pub fn write_fixture_csvs(dir: &Path) -> Result<()> {
    let files = [
        (
            CUSTOMERS_FILE,
            "customer_id,customer_unique_id,customer_zip_code_prefix,customer_city,customer_state\n\
             c1,u1,14409,franca,SP\n\
             c2,u2,9790,sao bernardo do campo,SP\n\
             c3,u3,1151,sao paulo,SP\n\
             c4,u4,8775,mogi das cruzes,SP\n\
             c1,u1,14409,franca,SP\n",
        ),
        (
            ORDERS_FILE,
            "order_id,customer_id,order_status,order_purchase_timestamp\n\
             o1,c1,delivered,2017-10-02 10:56:33\n\
             o2,c2,delivered,2017-10-02 21:03:01\n\
             o3,c3,shipped,2018-02-28 08:15:00\n\
             o4,c4,canceled,2018-03-01 00:00:00\n",
        ),
        (
            ORDER_ITEMS_FILE,
            "order_id,order_item_id,product_id,seller_id,price,freight_value\n\
             o1,1,p1,s1,58.90,13.29\n\
             o1,2,p2,s1,7.00,0.81\n\
             o2,1,p2,s2,239.90,19.93\n\
             o3,1,p3,s3,199.00,17.87\n",
        ),
        (
            ORDER_PAYMENTS_FILE,
            "order_id,payment_sequential,payment_type,payment_installments,payment_value\n\
             o1,1,credit_card,3,50.00\n\
             o1,2,credit_card,3,30.00\n\
             o2,1,voucher,1,259.83\n",
        ),
        (
            PRODUCTS_FILE,
            "product_id,product_category_name,product_weight_g\n\
             p1,perfumaria,225\n\
             p2,artes,1000\n\
             p3,,154\n",
        ),
    ];

    for (name, content) in files {
        std::fs::write(dir.join(name), content).with_context(|| format!("writing {}", name))?;
    }
    Ok(())
}

pub async fn count(conn: &mut PgConnection, table: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}
