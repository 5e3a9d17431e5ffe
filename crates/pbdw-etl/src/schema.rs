//! Warehouse schema
//!
//! Star schema: four dimensions and one fact table keyed by order. Every
//! statement is `IF NOT EXISTS`, so initialization runs on every ETL pass.

use sqlx::PgConnection;
use tracing::{error, info};

pub const DIM_CUSTOMERS: &str = "dim_customers";
pub const DIM_PRODUCTS: &str = "dim_products";
pub const DIM_PAYMENTS: &str = "dim_payments";
pub const DIM_DATES: &str = "dim_dates";
pub const FACT_ORDERS: &str = "fact_orders";

/// Dimension tables first; the fact table references all of them.
pub const TABLES: [&str; 5] = [DIM_CUSTOMERS, DIM_PRODUCTS, DIM_PAYMENTS, DIM_DATES, FACT_ORDERS];

const STATEMENTS: &[(&str, &str)] = &[
    (
        DIM_CUSTOMERS,
        r#"
        CREATE TABLE IF NOT EXISTS dim_customers (
            customer_id VARCHAR PRIMARY KEY,
            state VARCHAR
        )
        "#,
    ),
    (
        DIM_PRODUCTS,
        r#"
        CREATE TABLE IF NOT EXISTS dim_products (
            product_id VARCHAR PRIMARY KEY,
            category VARCHAR
        )
        "#,
    ),
    (
        DIM_PAYMENTS,
        r#"
        CREATE TABLE IF NOT EXISTS dim_payments (
            payment_id SERIAL PRIMARY KEY,
            payment_type VARCHAR,
            installments INT
        )
        "#,
    ),
    (
        "idx_dim_payments_natural_key",
        r#"
        CREATE INDEX IF NOT EXISTS idx_dim_payments_natural_key
            ON dim_payments (payment_type, installments)
        "#,
    ),
    (
        DIM_DATES,
        r#"
        CREATE TABLE IF NOT EXISTS dim_dates (
            calendar_date DATE PRIMARY KEY,
            year INT,
            month INT,
            day INT
        )
        "#,
    ),
    (
        FACT_ORDERS,
        r#"
        CREATE TABLE IF NOT EXISTS fact_orders (
            order_id VARCHAR PRIMARY KEY,
            customer_id VARCHAR REFERENCES dim_customers (customer_id),
            product_id VARCHAR REFERENCES dim_products (product_id),
            payment_id INT REFERENCES dim_payments (payment_id),
            purchase_date DATE REFERENCES dim_dates (calendar_date),
            amount_paid NUMERIC,
            review_score INT
        )
        "#,
    ),
];

/// Outcome of schema initialization
#[derive(Debug, Clone, Default)]
pub struct SchemaReport {
    /// Objects that exist after the run
    pub ensured: Vec<&'static str>,
    /// Objects whose statement failed, with the error message
    pub failed: Vec<(&'static str, String)>,
}

impl SchemaReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Create the warehouse tables if missing
///
/// Each statement commits on its own. A failing statement is logged and
/// recorded; the following statements still run.
pub async fn initialize(conn: &mut PgConnection) -> SchemaReport {
    let mut report = SchemaReport::default();

    for &(name, ddl) in STATEMENTS {
        match sqlx::query(ddl).execute(&mut *conn).await {
            Ok(_) => report.ensured.push(name),
            Err(e) => {
                error!(object = name, error = %e, "Failed to create schema object");
                report.failed.push((name, e.to_string()));
            },
        }
    }

    if report.is_complete() {
        info!(objects = report.ensured.len(), "Warehouse schema ready");
    }

    report
}
