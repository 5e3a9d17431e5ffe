//! Fact loader

use mongodb::Collection;
use sqlx::{Connection, PgConnection};
use tracing::{info, warn};

use super::{fetch_payment_keys, insert_in_batches, LoadStats};
use crate::error::EtlResult;
use crate::extract::{fetch_review_scores, ReviewDocument, SourceTables};
use crate::schema::FACT_ORDERS;
use crate::transform::{aggregate_payments, FactExclusions, FactPlan, FactRow};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FactLoadStats {
    pub load: LoadStats,
    pub exclusions: FactExclusions,
}

/// Build and insert the fact rows
///
/// Payment keys are read back from the payment dimension, so this must run
/// after the dimension loaders.
pub async fn load_facts(
    conn: &mut PgConnection,
    reviews: &Collection<ReviewDocument>,
    tables: &SourceTables,
    batch_size: usize,
) -> EtlResult<FactLoadStats> {
    let payments = aggregate_payments(&tables.payments);
    let keys = fetch_payment_keys(conn).await?;
    let scores = fetch_review_scores(reviews).await?;

    let plan = FactPlan::build(&tables.orders, &tables.order_items, &payments, &keys, &scores);
    info!(
        table = FACT_ORDERS,
        rows = plan.rows.len(),
        aggregated_payments = payments.len(),
        reviews = scores.len(),
        "Loading facts"
    );

    if plan.exclusions.excluded_orders() > 0 {
        warn!(
            unmapped_payment = plan.exclusions.unmapped_payment,
            no_payment = plan.exclusions.no_payment,
            no_items = plan.exclusions.no_items,
            "Orders excluded from the fact table"
        );
    }

    let load = insert_fact_rows(conn, &plan.rows, batch_size).await?;

    Ok(FactLoadStats {
        load,
        exclusions: plan.exclusions,
    })
}

/// Insert fact rows, skipping orders already present
pub async fn insert_fact_rows(
    conn: &mut PgConnection,
    rows: &[FactRow],
    batch_size: usize,
) -> EtlResult<LoadStats> {
    let mut tx = conn.begin().await?;
    let inserted = insert_in_batches(
        &mut tx,
        FACT_ORDERS,
        rows,
        batch_size,
        "INSERT INTO fact_orders (order_id, customer_id, product_id, payment_id, \
         purchase_date, amount_paid, review_score) ",
        " ON CONFLICT (order_id) DO NOTHING",
        |mut b, row| {
            b.push_bind(&row.order_id)
                .push_bind(&row.customer_id)
                .push_bind(&row.product_id)
                .push_bind(row.payment_id)
                .push_bind(row.purchase_date)
                .push_bind(&row.amount_paid)
                .push_bind(row.review_score);
        },
    )
    .await?;
    tx.commit().await?;

    Ok(LoadStats::new(rows.len(), inserted))
}
