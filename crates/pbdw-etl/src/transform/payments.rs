//! Per-order payment aggregation and the payment-dimension key lookup

use std::collections::HashMap;

use sqlx::types::BigDecimal;

use crate::extract::PaymentRecord;

/// All payment records of one order collapsed into one logical payment
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPayment {
    pub order_id: String,
    /// Method of the lowest `payment_sequential` record
    pub payment_type: String,
    /// Installments of the lowest `payment_sequential` record
    pub installments: i32,
    /// Sum of every record's value
    pub amount: BigDecimal,
    lead_sequential: u32,
}

/// Group payment records by order
///
/// Method and installment count come from the record with the lowest
/// `payment_sequential`; on equal sequence numbers the first record in the
/// file wins. Orders are returned in first-seen order.
pub fn aggregate_payments(records: &[PaymentRecord]) -> Vec<OrderPayment> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut payments: Vec<OrderPayment> = Vec::new();

    for record in records {
        match index.get(record.order_id.as_str()) {
            Some(&i) => {
                let payment = &mut payments[i];
                payment.amount += &record.payment_value;
                if record.payment_sequential < payment.lead_sequential {
                    payment.payment_type = record.payment_type.clone();
                    payment.installments = record.payment_installments;
                    payment.lead_sequential = record.payment_sequential;
                }
            },
            None => {
                index.insert(&record.order_id, payments.len());
                payments.push(OrderPayment {
                    order_id: record.order_id.clone(),
                    payment_type: record.payment_type.clone(),
                    installments: record.payment_installments,
                    amount: record.payment_value.clone(),
                    lead_sequential: record.payment_sequential,
                });
            },
        }
    }

    payments
}

/// `(method, installments) -> payment_id` as stored in the payment dimension
#[derive(Debug, Clone, Default)]
pub struct PaymentKeys {
    keys: HashMap<(String, i32), i32>,
}

impl PaymentKeys {
    /// Build from `(payment_id, payment_type, installments)` rows
    ///
    /// If a combination appears more than once the smallest id is kept.
    pub fn from_rows(rows: impl IntoIterator<Item = (i32, String, i32)>) -> Self {
        let mut keys: HashMap<(String, i32), i32> = HashMap::new();
        for (id, payment_type, installments) in rows {
            keys.entry((payment_type, installments))
                .and_modify(|existing| *existing = (*existing).min(id))
                .or_insert(id);
        }
        Self { keys }
    }

    pub fn get(&self, payment_type: &str, installments: i32) -> Option<i32> {
        self.keys.get(&(payment_type.to_string(), installments)).copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
