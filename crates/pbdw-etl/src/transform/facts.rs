//! Fact-row assembly
//!
//! The fact table holds one row per order. Orders with several items are
//! collapsed to their lowest `order_item_id` before the join, so the product
//! on the fact row is deterministic and no item row is silently dropped by a
//! key conflict.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use sqlx::types::BigDecimal;

use super::payments::{OrderPayment, PaymentKeys};
use super::reviews::ReviewScores;
use crate::extract::{OrderItemRecord, OrderRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct FactRow {
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub payment_id: i32,
    pub purchase_date: NaiveDate,
    pub amount_paid: BigDecimal,
    pub review_score: Option<i32>,
}

/// Orders and item rows that did not become fact rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FactExclusions {
    /// Orders whose payment combination is missing from the payment dimension
    pub unmapped_payment: usize,
    /// Orders with no payment record at all
    pub no_payment: usize,
    /// Orders with no item row
    pub no_items: usize,
    /// Item rows folded into their order's first item
    pub collapsed_items: usize,
}

impl FactExclusions {
    /// Orders left out of the fact table
    pub fn excluded_orders(&self) -> usize {
        self.unmapped_payment + self.no_payment + self.no_items
    }
}

#[derive(Debug, Clone, Default)]
pub struct FactPlan {
    pub rows: Vec<FactRow>,
    pub exclusions: FactExclusions,
}

impl FactPlan {
    /// Join orders with their first item, payment key, date and score
    pub fn build(
        orders: &[OrderRecord],
        items: &[OrderItemRecord],
        payments: &[OrderPayment],
        keys: &PaymentKeys,
        reviews: &ReviewScores,
    ) -> Self {
        let mut exclusions = FactExclusions::default();

        let mut resolved: HashMap<&str, (i32, &BigDecimal)> = HashMap::new();
        let mut unmapped: HashSet<&str> = HashSet::new();
        for payment in payments {
            match keys.get(&payment.payment_type, payment.installments) {
                Some(id) => {
                    resolved.insert(&payment.order_id, (id, &payment.amount));
                },
                None => {
                    unmapped.insert(&payment.order_id);
                },
            }
        }

        let first_items = first_item_per_order(items);
        exclusions.collapsed_items = items.len() - first_items.len();

        let mut seen: HashSet<&str> = HashSet::new();
        let mut rows = Vec::new();

        for order in orders {
            if !seen.insert(&order.order_id) {
                continue;
            }

            let Some(item) = first_items.get(order.order_id.as_str()) else {
                exclusions.no_items += 1;
                continue;
            };

            let Some(&(payment_id, amount)) = resolved.get(order.order_id.as_str()) else {
                if unmapped.contains(order.order_id.as_str()) {
                    exclusions.unmapped_payment += 1;
                } else {
                    exclusions.no_payment += 1;
                }
                continue;
            };

            rows.push(FactRow {
                order_id: order.order_id.clone(),
                customer_id: order.customer_id.clone(),
                product_id: item.product_id.clone(),
                payment_id,
                purchase_date: order.order_purchase_timestamp.date(),
                amount_paid: amount.clone(),
                review_score: reviews.for_order(&order.order_id),
            });
        }

        Self { rows, exclusions }
    }
}

/// Lowest `order_item_id` per order; ties keep the first row in the file
fn first_item_per_order(items: &[OrderItemRecord]) -> HashMap<&str, &OrderItemRecord> {
    let mut first: HashMap<&str, &OrderItemRecord> = HashMap::new();
    for item in items {
        first
            .entry(item.order_id.as_str())
            .and_modify(|current| {
                if item.order_item_id < current.order_item_id {
                    *current = item;
                }
            })
            .or_insert(item);
    }
    first
}
