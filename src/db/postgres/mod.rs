// PostgreSQL record store. One sqlx transaction per unit of work.

mod organizations;
mod prices;
mod storages;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::db::errors::{DatabaseError, Result};
use crate::db::repository::{Database, UnitOfWork};
use crate::models::WasteType;

#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionError(format!("Failed to start transaction: {}", e)))?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

/// Open transaction; rolled back by sqlx when dropped uncommitted
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DatabaseError::TransactionError(format!("Failed to commit: {}", e)))?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DatabaseError::TransactionError(format!("Failed to roll back: {}", e)))?;
        debug!("Transaction rolled back");
        Ok(())
    }
}

/// Waste types and amounts as parallel arrays for `UNNEST($n::text[], $m::int[])`
fn unnest_columns<I>(items: I) -> (Vec<String>, Vec<i32>)
where
    I: IntoIterator<Item = (WasteType, i32)>,
{
    items
        .into_iter()
        .map(|(waste_type, amount)| (waste_type.as_str().to_string(), amount))
        .unzip()
}
