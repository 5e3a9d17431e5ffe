//! Loaders
//!
//! Every loader runs inside its own transaction and commits independently.
//! Rows are inserted with multi-row statements of `batch_size` rows and a
//! conflict-skip policy, so running a loader twice on the same input inserts
//! nothing the second time.

mod dimensions;
mod facts;

use sqlx::{postgres::Postgres, query_builder::Separated, PgConnection, QueryBuilder};
use tracing::debug;

use crate::error::EtlResult;

pub use dimensions::{
    fetch_payment_keys, load_customers, load_dates, load_payment_types, load_products,
};
pub use facts::{insert_fact_rows, load_facts, FactLoadStats};

/// Rows offered to a table and rows it actually accepted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub candidates: usize,
    pub inserted: u64,
}

impl LoadStats {
    pub fn new(candidates: usize, inserted: u64) -> Self {
        Self {
            candidates,
            inserted,
        }
    }

    /// Rows skipped because their key already existed
    pub fn skipped(&self) -> u64 {
        (self.candidates as u64).saturating_sub(self.inserted)
    }
}

/// Insert `rows` as `head VALUES (...), (...) tail`, one statement per batch
///
/// Returns the number of rows the database reported as inserted.
async fn insert_in_batches<'a, T, F>(
    conn: &mut PgConnection,
    table: &str,
    rows: &'a [T],
    batch_size: usize,
    head: &str,
    tail: &str,
    mut push_row: F,
) -> EtlResult<u64>
where
    F: for<'qb> FnMut(Separated<'qb, 'a, Postgres, &'static str>, &'a T),
{
    let mut inserted = 0u64;

    for (batch, chunk) in rows.chunks(batch_size.max(1)).enumerate() {
        let mut query_builder: QueryBuilder<'a, Postgres> = QueryBuilder::new(head);
        query_builder.push_values(chunk.iter(), |b, row| push_row(b, row));
        query_builder.push(tail);

        let result = query_builder.build().execute(&mut *conn).await?;
        inserted += result.rows_affected();

        debug!(
            table,
            batch,
            rows = chunk.len(),
            inserted = result.rows_affected(),
            "Inserted batch"
        );
    }

    Ok(inserted)
}
