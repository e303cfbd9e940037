use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, info};

use super::{unnest_columns, PgUnitOfWork};
use crate::db::errors::{DatabaseError, Result};
use crate::db::repository::OrganizationRepository;
use crate::models::{NewOrganization, Organization, OrganizationWaste, WasteType};

#[derive(Debug, sqlx::FromRow)]
struct OrganizationRow {
    id: i32,
    name: String,
    location_x: f64,
    location_y: f64,
}

#[derive(Debug, sqlx::FromRow)]
struct OrganizationWasteRow {
    organization_id: i32,
    waste_type: WasteType,
    amount: i32,
}

impl PgUnitOfWork {
    async fn load_organization_waste(
        &mut self,
        organization_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<OrganizationWaste>>> {
        let rows = sqlx::query_as::<_, OrganizationWasteRow>(
            r#"
            SELECT organization_id, waste_type, amount
            FROM organization_waste
            WHERE organization_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(organization_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        let mut by_organization: HashMap<i32, Vec<OrganizationWaste>> = HashMap::new();
        for row in rows {
            by_organization
                .entry(row.organization_id)
                .or_default()
                .push(OrganizationWaste {
                    waste_type: row.waste_type,
                    amount: row.amount,
                });
        }
        Ok(by_organization)
    }

    async fn insert_organization_waste(
        &mut self,
        organization_id: i32,
        generated_waste: &[OrganizationWaste],
    ) -> Result<()> {
        if generated_waste.is_empty() {
            return Ok(());
        }

        let (waste_types, amounts) =
            unnest_columns(generated_waste.iter().map(|w| (w.waste_type, w.amount)));

        sqlx::query(
            r#"
            INSERT INTO organization_waste (organization_id, waste_type, amount)
            SELECT $1, t.waste_type::waste_type, t.amount
            FROM UNNEST($2::text[], $3::int[]) AS t(waste_type, amount)
            "#,
        )
        .bind(organization_id)
        .bind(&waste_types[..])
        .bind(&amounts[..])
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from_write(e, "organization waste"))?;

        debug!("Inserted {} waste line items for organization {}", generated_waste.len(), organization_id);
        Ok(())
    }
}

fn assemble(row: OrganizationRow, generated_waste: Vec<OrganizationWaste>) -> Organization {
    Organization {
        id: row.id,
        name: row.name,
        location_x: row.location_x,
        location_y: row.location_y,
        generated_waste,
    }
}

#[async_trait]
impl OrganizationRepository for PgUnitOfWork {
    #[tracing::instrument(skip(self))]
    async fn list_organizations(&mut self) -> Result<Vec<Organization>> {
        let rows = sqlx::query_as::<_, OrganizationRow>(
            "SELECT id, name, location_x, location_y FROM organizations ORDER BY id",
        )
        .fetch_all(&mut *self.tx)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut waste = self.load_organization_waste(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = waste.remove(&row.id).unwrap_or_default();
                assemble(row, items)
            })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn get_organization(&mut self, organization_id: i32) -> Result<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            "SELECT id, name, location_x, location_y FROM organizations WHERE id = $1",
        )
        .bind(organization_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut waste = self.load_organization_waste(&[row.id]).await?;
        let items = waste.remove(&row.id).unwrap_or_default();
        Ok(Some(assemble(row, items)))
    }

    #[tracing::instrument(skip(self, organization), fields(name = %organization.name))]
    async fn create_organization(&mut self, organization: &NewOrganization) -> Result<i32> {
        let organization_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO organizations (name, location_x, location_y)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&organization.name)
        .bind(organization.location_x)
        .bind(organization.location_y)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from_write(e, "organization"))?;

        self.insert_organization_waste(organization_id, &organization.generated_waste)
            .await?;

        info!("Created organization with ID: {}", organization_id);
        Ok(organization_id)
    }

    #[tracing::instrument(skip(self, organization))]
    async fn update_organization(
        &mut self,
        organization_id: i32,
        organization: &NewOrganization,
    ) -> Result<Option<i32>> {
        let updated: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE organizations
            SET name = $2, location_x = $3, location_y = $4
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(organization_id)
        .bind(&organization.name)
        .bind(organization.location_x)
        .bind(organization.location_y)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from_write(e, "organization"))?;

        if updated.is_none() {
            return Ok(None);
        }

        let deleted = sqlx::query("DELETE FROM organization_waste WHERE organization_id = $1")
            .bind(organization_id)
            .execute(&mut *self.tx)
            .await?
            .rows_affected();
        debug!("Replaced {} waste line items", deleted);

        self.insert_organization_waste(organization_id, &organization.generated_waste)
            .await?;

        info!("Updated organization {}", organization_id);
        Ok(Some(organization_id))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_organization(&mut self, organization_id: i32) -> Result<Option<i32>> {
        // Line items go with the row through ON DELETE CASCADE
        let deleted: Option<i32> =
            sqlx::query_scalar("DELETE FROM organizations WHERE id = $1 RETURNING id")
                .bind(organization_id)
                .fetch_optional(&mut *self.tx)
                .await?;

        if deleted.is_some() {
            info!("Deleted organization {}", organization_id);
        }
        Ok(deleted)
    }

    #[tracing::instrument(skip(self))]
    async fn lock_organization(&mut self, organization_id: i32) -> Result<()> {
        sqlx::query("SELECT id FROM organizations WHERE id = $1 FOR UPDATE")
            .bind(organization_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn increment_organization_waste(
        &mut self,
        organization_id: i32,
        waste_type: WasteType,
        amount: i32,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO organization_waste (organization_id, waste_type, amount)
            VALUES ($1, $2, $3)
            ON CONFLICT (organization_id, waste_type)
            DO UPDATE SET amount = organization_waste.amount + EXCLUDED.amount
            "#,
        )
        .bind(organization_id)
        .bind(waste_type)
        .bind(amount)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from_write(e, "organization waste"))?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn decrement_organization_waste(
        &mut self,
        organization_id: i32,
        waste_type: WasteType,
        amount: i32,
    ) -> Result<()> {
        let affected = sqlx::query(
            r#"
            UPDATE organization_waste
            SET amount = amount - $3
            WHERE organization_id = $1 AND waste_type = $2 AND amount >= $3
            "#,
        )
        .bind(organization_id)
        .bind(waste_type)
        .bind(amount)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DatabaseError::from_write(e, "organization waste"))?
        .rows_affected();

        if affected == 0 {
            return Err(DatabaseError::Conflict(format!(
                "organization {} holds less than {} of {}",
                organization_id, amount, waste_type
            )));
        }
        Ok(())
    }
}
