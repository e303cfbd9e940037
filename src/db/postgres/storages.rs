use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info};

use super::{unnest_columns, PgUnitOfWork};
use crate::db::errors::{DatabaseError, Result};
use crate::db::repository::StorageRepository;
use crate::models::{NewStorage, Storage, StorageCapacity, StorageCurrentLevel, WasteType};

#[derive(Debug, sqlx::FromRow)]
struct StorageRow {
    id: i32,
    name: String,
    location_x: f64,
    location_y: f64,
}

#[derive(Debug, sqlx::FromRow)]
struct LineItemRow {
    storage_id: i32,
    waste_type: WasteType,
    amount: i32,
}

#[derive(Default)]
struct StorageLineItems {
    capacities: HashMap<i32, Vec<StorageCapacity>>,
    current_levels: HashMap<i32, Vec<StorageCurrentLevel>>,
}

impl StorageLineItems {
    fn take(&mut self, row: StorageRow) -> Storage {
        Storage {
            capacities: self.capacities.remove(&row.id).unwrap_or_default(),
            current_levels: self.current_levels.remove(&row.id).unwrap_or_default(),
            id: row.id,
            name: row.name,
            location_x: row.location_x,
            location_y: row.location_y,
        }
    }
}

impl PgUnitOfWork {
    async fn load_storage_line_items(&mut self, storage_ids: &[i32]) -> Result<StorageLineItems> {
        let capacity_rows = sqlx::query_as::<_, LineItemRow>(
            r#"
            SELECT storage_id, waste_type, capacity AS amount
            FROM storage_capacities
            WHERE storage_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(storage_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        let level_rows = sqlx::query_as::<_, LineItemRow>(
            r#"
            SELECT storage_id, waste_type, current_amount AS amount
            FROM storage_current_levels
            WHERE storage_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(storage_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        let mut items = StorageLineItems::default();
        for row in capacity_rows {
            items.capacities.entry(row.storage_id).or_default().push(StorageCapacity {
                waste_type: row.waste_type,
                capacity: row.amount,
            });
        }
        for row in level_rows {
            items.current_levels.entry(row.storage_id).or_default().push(StorageCurrentLevel {
                waste_type: row.waste_type,
                current_amount: row.amount,
            });
        }
        Ok(items)
    }

    async fn insert_storage_line_items(&mut self, storage_id: i32, storage: &NewStorage) -> Result<()> {
        if !storage.capacities.is_empty() {
            let (waste_types, capacities) =
                unnest_columns(storage.capacities.iter().map(|c| (c.waste_type, c.capacity)));

            sqlx::query(
                r#"
                INSERT INTO storage_capacities (storage_id, waste_type, capacity)
                SELECT $1, t.waste_type::waste_type, t.capacity
                FROM UNNEST($2::text[], $3::int[]) AS t(waste_type, capacity)
                "#,
            )
            .bind(storage_id)
            .bind(&waste_types[..])
            .bind(&capacities[..])
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::from_write(e, "storage capacity"))?;
        }

        if !storage.current_levels.is_empty() {
            let (waste_types, amounts) = unnest_columns(
                storage.current_levels.iter().map(|l| (l.waste_type, l.current_amount)),
            );

            sqlx::query(
                r#"
                INSERT INTO storage_current_levels (storage_id, waste_type, current_amount)
                SELECT $1, t.waste_type::waste_type, t.current_amount
                FROM UNNEST($2::text[], $3::int[]) AS t(waste_type, current_amount)
                "#,
            )
            .bind(storage_id)
            .bind(&waste_types[..])
            .bind(&amounts[..])
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DatabaseError::from_write(e, "storage current level"))?;
        }

        debug!(
            "Inserted {} capacities and {} current levels for storage {}",
            storage.capacities.len(),
            storage.current_levels.len(),
            storage_id
        );
        Ok(())
    }
}

#[async_trait]
impl StorageRepository for PgUnitOfWork {
    #[tracing::instrument(skip(self))]
    async fn list_storages(&mut self) -> Result<Vec<Storage>> {
        let rows = sqlx::query_as::<_, StorageRow>(
            "SELECT id, name, location_x, location_y FROM storages ORDER BY id",
        )
        .fetch_all(&mut *self.tx)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut items = self.load_storage_line_items(&ids).await?;

        Ok(rows.into_iter().map(|row| items.take(row)).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn get_storage(&mut self, storage_id: i32) -> Result<Option<Storage>> {
        let row = sqlx::query_as::<_, StorageRow>(
            "SELECT id, name, location_x, location_y FROM storages WHERE id = $1",
        )
        .bind(storage_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = self.load_storage_line_items(&[row.id]).await?;
        Ok(Some(items.take(row)))
    }

    #[tracing::instrument(skip(self, storage), fields(name = %storage.name))]
    async fn create_storage(&mut self, storage: &NewStorage) -> Result<i32> {
        let storage_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO storages (name, location_x, location_y)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&storage.name)
        .bind(storage.location_x)
        .bind(storage.location_y)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from_write(e, "storage name"))?;

        self.insert_storage_line_items(storage_id, storage).await?;

        info!("Created storage with ID: {}", storage_id);
        Ok(storage_id)
    }

    #[tracing::instrument(skip(self, storage))]
    async fn update_storage(&mut self, storage_id: i32, storage: &NewStorage) -> Result<Option<i32>> {
        let updated: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE storages
            SET name = $2, location_x = $3, location_y = $4
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(storage_id)
        .bind(&storage.name)
        .bind(storage.location_x)
        .bind(storage.location_y)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from_write(e, "storage name"))?;

        if updated.is_none() {
            return Ok(None);
        }

        sqlx::query("DELETE FROM storage_capacities WHERE storage_id = $1")
            .bind(storage_id)
            .execute(&mut *self.tx)
            .await?;
        sqlx::query("DELETE FROM storage_current_levels WHERE storage_id = $1")
            .bind(storage_id)
            .execute(&mut *self.tx)
            .await?;

        self.insert_storage_line_items(storage_id, storage).await?;

        info!("Updated storage {}", storage_id);
        Ok(Some(storage_id))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_storage(&mut self, storage_id: i32) -> Result<Option<i32>> {
        let deleted: Option<i32> =
            sqlx::query_scalar("DELETE FROM storages WHERE id = $1 RETURNING id")
                .bind(storage_id)
                .fetch_optional(&mut *self.tx)
                .await?;

        if deleted.is_some() {
            info!("Deleted storage {}", storage_id);
        }
        Ok(deleted)
    }

    #[tracing::instrument(skip(self))]
    async fn lock_storage(&mut self, storage_id: i32) -> Result<()> {
        sqlx::query("SELECT id FROM storages WHERE id = $1 FOR UPDATE")
            .bind(storage_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn increment_storage_level(
        &mut self,
        storage_id: i32,
        waste_type: WasteType,
        amount: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO storage_current_levels (storage_id, waste_type, current_amount)
            VALUES ($1, $2, $3)
            ON CONFLICT (storage_id, waste_type)
            DO UPDATE SET current_amount = storage_current_levels.current_amount + EXCLUDED.current_amount
            "#,
        )
        .bind(storage_id)
        .bind(waste_type)
        .bind(amount)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from_write(e, "storage current level"))?;

        Ok(())
    }
}
