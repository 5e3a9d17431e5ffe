//! Pure transformations from source rows to warehouse rows
//!
//! Nothing in here touches a database. The lookup maps built here are
//! immutable once constructed and are passed by reference into the loaders.

mod dimensions;
mod facts;
mod payments;
mod reviews;

pub use dimensions::{
    distinct_customers, distinct_dates, distinct_payment_types, distinct_products, CustomerRow,
    DateRow, PaymentTypeRow, ProductRow,
};
pub use facts::{FactExclusions, FactPlan, FactRow};
pub use payments::{aggregate_payments, OrderPayment, PaymentKeys};
pub use reviews::{score_from_bson, ReviewScores};
