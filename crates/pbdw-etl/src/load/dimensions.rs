//! Dimension loaders

use sqlx::{Connection, PgConnection};
use tracing::info;

use super::{insert_in_batches, LoadStats};
use crate::error::EtlResult;
use crate::extract::{CustomerRecord, OrderRecord, PaymentRecord, ProductRecord};
use crate::schema::{DIM_CUSTOMERS, DIM_DATES, DIM_PAYMENTS, DIM_PRODUCTS};
use crate::transform::{
    distinct_customers, distinct_dates, distinct_payment_types, distinct_products, PaymentKeys,
};

pub async fn load_customers(
    conn: &mut PgConnection,
    records: &[CustomerRecord],
    batch_size: usize,
) -> EtlResult<LoadStats> {
    let rows = distinct_customers(records);
    info!(table = DIM_CUSTOMERS, rows = rows.len(), "Loading dimension");

    let mut tx = conn.begin().await?;
    let inserted = insert_in_batches(
        &mut tx,
        DIM_CUSTOMERS,
        &rows,
        batch_size,
        "INSERT INTO dim_customers (customer_id, state) ",
        " ON CONFLICT (customer_id) DO NOTHING",
        |mut b, row| {
            b.push_bind(&row.customer_id).push_bind(&row.state);
        },
    )
    .await?;
    tx.commit().await?;

    Ok(LoadStats::new(rows.len(), inserted))
}

pub async fn load_products(
    conn: &mut PgConnection,
    records: &[ProductRecord],
    batch_size: usize,
) -> EtlResult<LoadStats> {
    let rows = distinct_products(records);
    info!(table = DIM_PRODUCTS, rows = rows.len(), "Loading dimension");

    let mut tx = conn.begin().await?;
    let inserted = insert_in_batches(
        &mut tx,
        DIM_PRODUCTS,
        &rows,
        batch_size,
        "INSERT INTO dim_products (product_id, category) ",
        " ON CONFLICT (product_id) DO NOTHING",
        |mut b, row| {
            b.push_bind(&row.product_id).push_bind(&row.category);
        },
    )
    .await?;
    tx.commit().await?;

    Ok(LoadStats::new(rows.len(), inserted))
}

/// Load every (method, installments) combination
///
/// The surrogate key never conflicts, so rows are filtered against the
/// natural key instead. NULL-safe comparison keeps this correct for rows
/// written by other tools.
pub async fn load_payment_types(
    conn: &mut PgConnection,
    records: &[PaymentRecord],
    batch_size: usize,
) -> EtlResult<LoadStats> {
    let rows = distinct_payment_types(records);
    info!(table = DIM_PAYMENTS, rows = rows.len(), "Loading dimension");

    let mut tx = conn.begin().await?;
    let inserted = insert_in_batches(
        &mut tx,
        DIM_PAYMENTS,
        &rows,
        batch_size,
        "INSERT INTO dim_payments (payment_type, installments) \
         SELECT v.payment_type, v.installments FROM (",
        ") AS v (payment_type, installments) \
         WHERE NOT EXISTS ( \
             SELECT 1 FROM dim_payments p \
             WHERE p.payment_type IS NOT DISTINCT FROM v.payment_type \
               AND p.installments IS NOT DISTINCT FROM v.installments)",
        |mut b, row| {
            b.push_bind(&row.payment_type).push_bind(row.installments);
        },
    )
    .await?;
    tx.commit().await?;

    Ok(LoadStats::new(rows.len(), inserted))
}

/// Load purchase dates with their year/month/day parts
pub async fn load_dates(
    conn: &mut PgConnection,
    orders: &[OrderRecord],
    batch_size: usize,
) -> EtlResult<LoadStats> {
    let rows = distinct_dates(orders);
    info!(table = DIM_DATES, rows = rows.len(), "Loading dimension");

    let mut tx = conn.begin().await?;
    let inserted = insert_in_batches(
        &mut tx,
        DIM_DATES,
        &rows,
        batch_size,
        "INSERT INTO dim_dates (calendar_date, year, month, day) ",
        " ON CONFLICT (calendar_date) DO NOTHING",
        |mut b, row| {
            b.push_bind(row.date())
                .push_bind(row.year())
                .push_bind(row.month())
                .push_bind(row.day());
        },
    )
    .await?;
    tx.commit().await?;

    Ok(LoadStats::new(rows.len(), inserted))
}

/// Read the payment dimension back into a natural-key lookup
pub async fn fetch_payment_keys(conn: &mut PgConnection) -> EtlResult<PaymentKeys> {
    let rows: Vec<(i32, Option<String>, Option<i32>)> =
        sqlx::query_as("SELECT payment_id, payment_type, installments FROM dim_payments")
            .fetch_all(&mut *conn)
            .await?;

    let keys = PaymentKeys::from_rows(rows.into_iter().filter_map(|(id, kind, installments)| {
        Some((id, kind?, installments?))
    }));

    info!(combinations = keys.len(), "Payment keys loaded");
    Ok(keys)
}
