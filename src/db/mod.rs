pub mod connection;
pub mod errors;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use connection::*;
pub use errors::*;
pub use memory::MemoryDatabase;
pub use postgres::PgDatabase;
pub use repository::*;

use tracing::warn;

/// Close a unit of work: commit when `result` is `Ok`, roll back otherwise.
///
/// A failed rollback is logged and the original error returned.
pub async fn finish<T, E>(uow: Box<dyn UnitOfWork>, result: std::result::Result<T, E>) -> std::result::Result<T, E>
where
    E: From<DatabaseError>,
{
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}
