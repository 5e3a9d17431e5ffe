//! ETL error types
//!
//! Connection and extraction errors are fatal for a run; every other variant
//! surfaces from a single load step and is isolated by the pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for ETL operations
pub type EtlResult<T> = std::result::Result<T, EtlError>;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Failed to connect to PostgreSQL at {address}: {source}")]
    PostgresConnect {
        address: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to connect to MongoDB at {address}: {source}")]
    MongoConnect {
        address: String,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Extract {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Document store error: {0}")]
    DocumentStore(#[from] mongodb::error::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Common(#[from] pbdw_common::CommonError),
}

impl EtlError {
    /// Create an extraction error for a file
    pub fn extract(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Extract {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error aborts the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::PostgresConnect { .. }
                | Self::MongoConnect { .. }
                | Self::Extract { .. }
                | Self::Config(_)
        )
    }
}
