//! Dimension projections
//!
//! Each projection keeps exact-duplicate removal in first-seen order, so the
//! row that survives a later key conflict is the first one in the file.

use std::collections::HashSet;
use std::hash::Hash;

use chrono::{Datelike, NaiveDate};

use crate::extract::{CustomerRecord, OrderRecord, PaymentRecord, ProductRecord};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomerRow {
    pub customer_id: String,
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductRow {
    pub product_id: String,
    pub category: Option<String>,
}

/// Natural key of the payment dimension
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaymentTypeRow {
    pub payment_type: String,
    pub installments: i32,
}

/// Calendar date with its derived parts
///
/// The parts are private and only computed in [`DateRow::from_date`], so
/// they always decompose the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRow {
    date: NaiveDate,
    year: i32,
    month: i32,
    day: i32,
}

impl DateRow {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            date,
            year: date.year(),
            month: date.month() as i32,
            day: date.day() as i32,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> i32 {
        self.month
    }

    pub fn day(&self) -> i32 {
        self.day
    }
}

fn distinct<T: Eq + Hash + Clone>(rows: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    rows.into_iter().filter(|row| seen.insert(row.clone())).collect()
}

pub fn distinct_customers(records: &[CustomerRecord]) -> Vec<CustomerRow> {
    distinct(records.iter().map(|r| CustomerRow {
        customer_id: r.customer_id.clone(),
        state: r.customer_state.clone(),
    }))
}

pub fn distinct_products(records: &[ProductRecord]) -> Vec<ProductRow> {
    distinct(records.iter().map(|r| ProductRow {
        product_id: r.product_id.clone(),
        category: r.product_category_name.clone(),
    }))
}

/// Every (method, installments) combination seen in any payment record
pub fn distinct_payment_types(records: &[PaymentRecord]) -> Vec<PaymentTypeRow> {
    distinct(records.iter().map(|r| PaymentTypeRow {
        payment_type: r.payment_type.clone(),
        installments: r.payment_installments,
    }))
}

/// Purchase dates truncated to the calendar day
pub fn distinct_dates(orders: &[OrderRecord]) -> Vec<DateRow> {
    distinct(orders.iter().map(|o| o.order_purchase_timestamp.date()))
        .into_iter()
        .map(DateRow::from_date)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::extract::parse_timestamp;
    use std::str::FromStr;
    use sqlx::types::BigDecimal;

    fn order(id: &str, ts: &str) -> OrderRecord {
        OrderRecord {
            order_id: id.to_string(),
            customer_id: "c1".to_string(),
            order_purchase_timestamp: parse_timestamp(ts).unwrap(),
        }
    }

    #[test]
    fn test_distinct_customers_keeps_first_seen_order() {
        let records = vec![
            CustomerRecord { customer_id: "c2".into(), customer_state: Some("RJ".into()) },
            CustomerRecord { customer_id: "c1".into(), customer_state: Some("SP".into()) },
            CustomerRecord { customer_id: "c2".into(), customer_state: Some("RJ".into()) },
        ];

        let rows = distinct_customers(&records);
        let ids: Vec<&str> = rows.iter().map(|r| r.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
    }

    #[test]
    fn test_only_exact_duplicates_are_removed() {
        // Same key, different attribute: both survive, the table key decides.
        let records = vec![
            ProductRecord { product_id: "p1".into(), product_category_name: Some("a".into()) },
            ProductRecord { product_id: "p1".into(), product_category_name: None },
        ];
        assert_eq!(distinct_products(&records).len(), 2);
    }

    #[test]
    fn test_distinct_payment_types() {
        let payment = |kind: &str, installments: i32| PaymentRecord {
            order_id: "o".into(),
            payment_sequential: 1,
            payment_type: kind.into(),
            payment_installments: installments,
            payment_value: BigDecimal::from_str("1.00").unwrap(),
        };
        let records =
            vec![payment("credit_card", 3), payment("boleto", 1), payment("credit_card", 3)];

        let rows = distinct_payment_types(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], PaymentTypeRow { payment_type: "credit_card".into(), installments: 3 });
    }

    #[test]
    fn test_distinct_dates_truncate_time_of_day() {
        let orders = vec![
            order("o1", "2017-10-02 10:56:33"),
            order("o2", "2017-10-02 23:59:59"),
            order("o3", "2018-01-31 00:00:00"),
        ];

        let rows = distinct_dates(&orders);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date(), NaiveDate::from_ymd_opt(2017, 10, 2).unwrap());
        assert_eq!((rows[1].year(), rows[1].month(), rows[1].day()), (2018, 1, 31));
    }

    #[test]
    fn test_date_parts_decompose_the_key() {
        let mut date = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();

        while date < end {
            let row = DateRow::from_date(date);
            let rebuilt =
                NaiveDate::from_ymd_opt(row.year(), row.month() as u32, row.day() as u32);
            assert_eq!(rebuilt, Some(row.date()));
            date = date.succ_opt().unwrap();
        }
    }
}
