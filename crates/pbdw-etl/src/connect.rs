//! Store connections
//!
//! One PostgreSQL session and one review-collection handle per run. No pool,
//! no retries: a failure here aborts the run.

use mongodb::{bson::doc, options::ClientOptions, Client, Collection};
use sqlx::{
    postgres::{PgConnectOptions, PgConnection},
    Connection,
};
use tracing::{error, info};

use crate::config::{Config, MongoConfig, PostgresConfig};
use crate::error::{EtlError, EtlResult};
use crate::extract::ReviewDocument;

pub struct Connections {
    pub postgres: PgConnection,
    pub reviews: Collection<ReviewDocument>,
}

pub async fn connect_postgres(config: &PostgresConfig) -> EtlResult<PgConnection> {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .database(&config.database)
        .username(&config.user)
        .password(&config.password);

    let conn = PgConnection::connect_with(&options)
        .await
        .map_err(|source| EtlError::PostgresConnect {
            address: config.address(),
            source,
        })?;

    info!(address = %config.address(), "Connected to PostgreSQL");
    Ok(conn)
}

/// Open the review collection and check the server answers a ping
pub async fn connect_mongo(config: &MongoConfig) -> EtlResult<Collection<ReviewDocument>> {
    let connect_error = |source: mongodb::error::Error| EtlError::MongoConnect {
        address: config.address(),
        source,
    };

    let options = ClientOptions::parse(config.uri()).await.map_err(connect_error)?;
    let client = Client::with_options(options).map_err(connect_error)?;

    let database = client.database(&config.database);
    database
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(connect_error)?;

    info!(address = %config.address(), "Connected to MongoDB");
    Ok(database.collection::<ReviewDocument>(&config.collection))
}

/// Connect to both stores
///
/// Both connections are attempted so that every failure is logged; the first
/// error is returned.
pub async fn connect_all(config: &Config) -> EtlResult<Connections> {
    let postgres = connect_postgres(&config.postgres).await;
    if let Err(ref e) = postgres {
        error!(error = %e, "PostgreSQL connection failed");
    }

    let reviews = connect_mongo(&config.mongo).await;
    if let Err(ref e) = reviews {
        error!(error = %e, "MongoDB connection failed");
    }

    Ok(Connections {
        postgres: postgres?,
        reviews: reviews?,
    })
}
