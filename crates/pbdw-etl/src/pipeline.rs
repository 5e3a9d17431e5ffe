//! One ETL run
//!
//! connect -> extract -> ensure schema -> dimensions -> facts, strictly in
//! that order on a single session. Connection and extraction failures abort
//! the run. Each load step is isolated: its failure is recorded in the
//! [`RunSummary`] and the next step still runs.

use std::fmt;

use sqlx::{Connection, PgConnection};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::connect::{connect_all, Connections};
use crate::error::EtlResult;
use crate::extract::{extract_all, SourceTables};
use crate::load::{
    load_customers, load_dates, load_facts, load_payment_types, load_products, FactLoadStats,
    LoadStats,
};
use crate::schema::{self, SchemaReport};
use crate::transform::FactExclusions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Customers,
    Products,
    Payments,
    Dates,
    Facts,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = match self {
            Step::Customers => schema::DIM_CUSTOMERS,
            Step::Products => schema::DIM_PRODUCTS,
            Step::Payments => schema::DIM_PAYMENTS,
            Step::Dates => schema::DIM_DATES,
            Step::Facts => schema::FACT_ORDERS,
        };
        f.write_str(table)
    }
}

#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: Step,
    pub outcome: Result<LoadStats, String>,
}

/// Everything a run did, for the final report
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub schema: SchemaReport,
    pub steps: Vec<StepReport>,
    /// Present when the fact step succeeded
    pub fact_exclusions: Option<FactExclusions>,
}

impl RunSummary {
    pub fn new(schema: SchemaReport) -> Self {
        Self {
            schema,
            ..Default::default()
        }
    }

    /// Record a step result, logging a failure instead of propagating it
    pub fn record(&mut self, step: Step, result: EtlResult<LoadStats>) {
        let outcome = match result {
            Ok(stats) => {
                info!(
                    table = %step,
                    inserted = stats.inserted,
                    skipped = stats.skipped(),
                    "Step completed"
                );
                Ok(stats)
            },
            Err(e) => {
                error!(table = %step, error = %e, "Step failed, continuing with the next step");
                Err(e.to_string())
            },
        };
        self.steps.push(StepReport { step, outcome });
    }

    pub fn record_facts(&mut self, result: EtlResult<FactLoadStats>) {
        let result = result.map(|stats| {
            self.fact_exclusions = Some(stats.exclusions);
            stats.load
        });
        self.record(Step::Facts, result);
    }

    pub fn failed_steps(&self) -> Vec<Step> {
        self.steps
            .iter()
            .filter(|report| report.outcome.is_err())
            .map(|report| report.step)
            .collect()
    }

    /// True when the schema and every step succeeded
    pub fn is_complete(&self) -> bool {
        self.schema.is_complete() && self.failed_steps().is_empty()
    }

    pub fn log(&self) {
        for report in &self.steps {
            match &report.outcome {
                Ok(stats) => info!(
                    table = %report.step,
                    candidates = stats.candidates,
                    inserted = stats.inserted,
                    skipped = stats.skipped(),
                    "Load result"
                ),
                Err(message) => warn!(table = %report.step, error = %message, "Load failed"),
            }
        }

        if let Some(exclusions) = self.fact_exclusions {
            if exclusions.excluded_orders() > 0 {
                warn!(
                    excluded_orders = exclusions.excluded_orders(),
                    unmapped_payment = exclusions.unmapped_payment,
                    no_payment = exclusions.no_payment,
                    no_items = exclusions.no_items,
                    "Orders missing from the fact table"
                );
            }
            info!(
                collapsed_items = exclusions.collapsed_items,
                "Multi-item orders collapsed to their first item"
            );
        }

        if self.is_complete() {
            info!("ETL run finished");
        } else {
            warn!(
                schema_failures = self.schema.failed.len(),
                failed_steps = ?self.failed_steps(),
                "ETL run finished with failures"
            );
        }
    }
}

/// Execute one full ETL run
pub async fn run(config: &Config) -> EtlResult<RunSummary> {
    info!("Starting ETL run");

    let Connections {
        mut postgres,
        reviews,
    } = connect_all(config).await?;
    let tables = extract_all(&config.input)?;

    let schema = schema::initialize(&mut postgres).await;
    let mut summary = load_dimensions(&mut postgres, &tables, config.batch_size, schema).await;

    summary.record_facts(load_facts(&mut postgres, &reviews, &tables, config.batch_size).await);

    if let Err(e) = postgres.close().await {
        warn!(error = %e, "Failed to close PostgreSQL session cleanly");
    }

    Ok(summary)
}

/// Report how a run ended
///
/// A fatal error is logged and swallowed: the caller's exit status is the
/// same whether the run completed, partially failed or aborted early.
pub fn finish(result: EtlResult<RunSummary>) -> Option<RunSummary> {
    match result {
        Ok(summary) => {
            summary.log();
            Some(summary)
        },
        Err(e) => {
            error!(error = %e, fatal = e.is_fatal(), "Aborting ETL run");
            None
        },
    }
}

/// Run the four dimension loaders in order, isolating failures
pub async fn load_dimensions(
    conn: &mut PgConnection,
    tables: &SourceTables,
    batch_size: usize,
    schema: SchemaReport,
) -> RunSummary {
    let mut summary = RunSummary::new(schema);

    summary.record(Step::Customers, load_customers(conn, &tables.customers, batch_size).await);
    summary.record(Step::Products, load_products(conn, &tables.products, batch_size).await);
    summary.record(Step::Payments, load_payment_types(conn, &tables.payments, batch_size).await);
    summary.record(Step::Dates, load_dates(conn, &tables.orders, batch_size).await);

    summary
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::EtlError;

    #[test]
    fn test_failed_step_is_recorded_not_propagated() {
        let mut summary = RunSummary::default();
        summary.record(Step::Customers, Ok(LoadStats::new(3, 3)));
        summary.record(Step::Payments, Err(EtlError::config("boom")));
        summary.record(Step::Dates, Ok(LoadStats::new(2, 0)));

        assert_eq!(summary.steps.len(), 3);
        assert_eq!(summary.failed_steps(), vec![Step::Payments]);
        assert!(!summary.is_complete());
    }

    #[test]
    fn test_fact_exclusions_are_kept() {
        let mut summary = RunSummary::default();
        let exclusions = FactExclusions {
            unmapped_payment: 2,
            ..Default::default()
        };
        summary.record_facts(Ok(FactLoadStats {
            load: LoadStats::new(5, 5),
            exclusions,
        }));

        assert_eq!(summary.fact_exclusions, Some(exclusions));
        assert!(summary.is_complete());
    }

    #[test]
    fn test_fatal_error_is_logged_not_propagated() {
        let aborted = finish(Err(EtlError::config("no such input directory")));
        assert!(aborted.is_none());

        let completed = finish(Ok(RunSummary::default()));
        assert!(completed.is_some_and(|summary| summary.is_complete()));
    }

    #[test]
    fn test_step_names_are_table_names() {
        assert_eq!(Step::Dates.to_string(), "dim_dates");
        assert_eq!(Step::Facts.to_string(), "fact_orders");
    }
}
