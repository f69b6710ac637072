use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

use crate::config::AppConfig;

/// Failures surfaced by the user and movie stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the column name.
    #[error("duplicate value for unique column `{0}`")]
    Duplicate(&'static str),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")
}

/// Turns a unique violation on one of the `constraints` (name, column) into
/// [`StoreError::Duplicate`]; everything else stays a database error.
pub fn classify(err: sqlx::Error, constraints: &[(&str, &'static str)]) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            let column = db_err.constraint().and_then(|name| {
                constraints
                    .iter()
                    .find(|(constraint, _)| *constraint == name)
                    .map(|(_, column)| *column)
            });
            if let Some(column) = column {
                return StoreError::Duplicate(column);
            }
        }
    }
    StoreError::Database(err)
}
