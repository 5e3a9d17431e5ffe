//! Typed rows of the five source CSV files
//!
//! Only the columns the warehouse needs are declared; any other column in the
//! file is ignored. A missing declared column fails deserialization.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer};
use sqlx::types::BigDecimal;

/// Accepted layouts for purchase timestamps
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub customer_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub customer_id: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub order_purchase_timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderItemRecord {
    pub order_id: String,
    /// 1-based position of the item within its order
    pub order_item_id: u32,
    pub product_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentRecord {
    pub order_id: String,
    /// 1-based position of the payment within its order
    pub payment_sequential: u32,
    pub payment_type: String,
    pub payment_installments: i32,
    #[serde(deserialize_with = "deserialize_decimal")]
    pub payment_value: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductRecord {
    pub product_id: String,
    pub product_category_name: Option<String>,
}

/// Parse a purchase timestamp; a bare date means midnight
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

fn deserialize_decimal<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    BigDecimal::from_str(raw.trim())
        .map_err(|e| de::Error::custom(format!("invalid decimal '{}': {}", raw, e)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn read<T: serde::de::DeserializeOwned>(data: &str) -> Result<Vec<T>, csv::Error> {
        csv::Reader::from_reader(data.as_bytes()).deserialize().collect()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2017, 10, 2)
            .and_then(|d| d.and_hms_opt(10, 56, 33))
            .unwrap();
        assert_eq!(parse_timestamp("2017-10-02 10:56:33"), Some(expected));
        assert_eq!(parse_timestamp("2017-10-02T10:56:33"), Some(expected));

        let midnight = NaiveDate::from_ymd_opt(2018, 2, 28)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        assert_eq!(parse_timestamp(" 2018-02-28 "), Some(midnight));

        assert_eq!(parse_timestamp("02/10/2017"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_order_ignores_extra_columns() {
        let data = "order_id,customer_id,order_status,order_purchase_timestamp,order_approved_at\n\
                    o1,c1,delivered,2017-10-02 10:56:33,2017-10-02 11:07:15\n";
        let orders: Vec<OrderRecord> = read(data).unwrap();

        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "o1");
        assert_eq!(orders[0].order_purchase_timestamp.date().to_string(), "2017-10-02");
    }

    #[test]
    fn test_order_with_bad_timestamp_fails() {
        let data = "order_id,customer_id,order_purchase_timestamp\no1,c1,yesterday\n";
        let result: Result<Vec<OrderRecord>, _> = read(data);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_column_fails() {
        let data = "order_id,product_id\no1,p1\n";
        let result: Result<Vec<OrderItemRecord>, _> = read(data);
        assert!(result.is_err());
    }

    #[test]
    fn test_payment_value_is_exact_decimal() {
        let data = "order_id,payment_sequential,payment_type,payment_installments,payment_value\n\
                    o1,1,credit_card,8,99.33\n";
        let payments: Vec<PaymentRecord> = read(data).unwrap();

        assert_eq!(payments[0].payment_installments, 8);
        assert_eq!(payments[0].payment_value, BigDecimal::from_str("99.33").unwrap());
    }

    #[test]
    fn test_empty_category_is_none() {
        let data = "product_id,product_category_name,product_weight_g\np1,,500\np2,perfumaria,10\n";
        let products: Vec<ProductRecord> = read(data).unwrap();

        assert_eq!(products[0].product_category_name, None);
        assert_eq!(products[1].product_category_name.as_deref(), Some("perfumaria"));
    }
}
