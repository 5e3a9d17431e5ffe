//! Extraction of the flat source files and the review collection
//!
//! Any missing or malformed file aborts the run before a single row is
//! loaded.

mod records;
mod reviews;

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::InputConfig;
use crate::error::{EtlError, EtlResult};

pub use records::{
    parse_timestamp, CustomerRecord, OrderItemRecord, OrderRecord, PaymentRecord, ProductRecord,
};
pub use reviews::{fetch_review_scores, ReviewDocument};

/// The five source files, fully read into memory
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    pub customers: Vec<CustomerRecord>,
    pub orders: Vec<OrderRecord>,
    pub order_items: Vec<OrderItemRecord>,
    pub payments: Vec<PaymentRecord>,
    pub products: Vec<ProductRecord>,
}

/// Read all five CSV files
pub fn extract_all(input: &InputConfig) -> EtlResult<SourceTables> {
    info!(dir = %input.dir.display(), "Reading CSV files");

    let tables = SourceTables {
        customers: read_csv(&input.customers())?,
        orders: read_csv(&input.orders())?,
        order_items: read_csv(&input.order_items())?,
        payments: read_csv(&input.order_payments())?,
        products: read_csv(&input.products())?,
    };

    info!(
        customers = tables.customers.len(),
        orders = tables.orders.len(),
        order_items = tables.order_items.len(),
        payments = tables.payments.len(),
        products = tables.products.len(),
        "CSV files loaded"
    );

    Ok(tables)
}

/// Deserialize every row of a headed CSV file
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> EtlResult<Vec<T>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| EtlError::extract(path, e))?;

    let rows = reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|e| EtlError::extract(path, e))?;

    debug!(path = %path.display(), rows = rows.len(), "Read CSV file");
    Ok(rows)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{
        CUSTOMERS_FILE, ORDERS_FILE, ORDER_ITEMS_FILE, ORDER_PAYMENTS_FILE, PRODUCTS_FILE,
    };
    use std::path::PathBuf;

    fn write_inputs(dir: &Path) {
        let files = [
            (CUSTOMERS_FILE, "customer_id,customer_unique_id,customer_state\nc1,u1,SP\nc2,u2,RJ\n"),
            (ORDERS_FILE, "order_id,customer_id,order_purchase_timestamp\no1,c1,2017-10-02 10:56:33\n"),
            (ORDER_ITEMS_FILE, "order_id,order_item_id,product_id,price\no1,1,p1,29.99\no1,2,p2,10.00\n"),
            (
                ORDER_PAYMENTS_FILE,
                "order_id,payment_sequential,payment_type,payment_installments,payment_value\n\
                 o1,1,credit_card,1,39.99\n",
            ),
            (PRODUCTS_FILE, "product_id,product_category_name\np1,moveis_decoracao\np2,\n"),
        ];
        for (name, content) in files {
            std::fs::write(dir.join(name), content).unwrap();
        }
    }

    #[test]
    fn test_extract_all_reads_every_file() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path());

        let input = InputConfig { dir: dir.path().to_path_buf() };
        let tables = extract_all(&input).unwrap();

        assert_eq!(tables.customers.len(), 2);
        assert_eq!(tables.orders.len(), 1);
        assert_eq!(tables.order_items.len(), 2);
        assert_eq!(tables.payments.len(), 1);
        assert_eq!(tables.products.len(), 2);
        assert_eq!(tables.customers[1].customer_state.as_deref(), Some("RJ"));
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path());
        std::fs::remove_file(dir.path().join(PRODUCTS_FILE)).unwrap();

        let input = InputConfig { dir: dir.path().to_path_buf() };
        match extract_all(&input) {
            Err(EtlError::Extract { path, .. }) => {
                assert_eq!(path, dir.path().join(PRODUCTS_FILE));
            },
            other => panic!("expected extraction error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_malformed_row_fails_extraction() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path());
        std::fs::write(
            dir.path().join(ORDER_ITEMS_FILE),
            "order_id,order_item_id,product_id\no1,first,p1\n",
        )
        .unwrap();

        let input = InputConfig { dir: PathBuf::from(dir.path()) };
        let err = extract_all(&input).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains(ORDER_ITEMS_FILE));
    }
}
