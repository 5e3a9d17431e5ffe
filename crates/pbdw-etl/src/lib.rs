//! PBDW ETL Library
//!
//! Loads the Olist e-commerce data set into a PostgreSQL star schema.
//!
//! # Stages
//!
//! - **connect**: one PostgreSQL session and one MongoDB review collection
//! - **schema**: `CREATE TABLE IF NOT EXISTS` for four dimensions and the
//!   order fact table
//! - **extract**: the five source CSV files into typed records
//! - **load**: deduplicated, conflict-skipping batch inserts, dimensions
//!   before facts
//!
//! Connection and extraction failures abort a run; a failing load step is
//! logged and the run moves on to the next step.
//!
//! # Example
//!
//! ```no_run
//! use pbdw_etl::{config::Config, pipeline};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let summary = pipeline::run(&config).await?;
//!     summary.log();
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod config;
pub mod connect;
pub mod error;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod schema;
pub mod transform;

pub use error::{EtlError, EtlResult};
