use async_trait::async_trait;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::pagination::{OffsetPage, OffsetRequest},
    application::repos::{RepoError, VehiclesRepo},
    domain::entities::VehicleRecord,
    domain::vehicles::NewVehicle,
};

use super::PostgresRepositories;
use super::util::{convert_count, map_sqlx_error};

const VEHICLE_COLUMNS: &str =
    "id, brand, model, year, color, price, created_at, updated_at, deleted_at";

#[derive(sqlx::FromRow)]
struct VehicleRow {
    id: Uuid,
    brand: String,
    model: String,
    year: i32,
    color: String,
    price: Decimal,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    deleted_at: Option<OffsetDateTime>,
}

impl From<VehicleRow> for VehicleRecord {
    fn from(row: VehicleRow) -> Self {
        Self {
            id: row.id,
            brand: row.brand,
            model: row.model,
            year: row.year,
            color: row.color,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[async_trait]
impl VehiclesRepo for PostgresRepositories {
    async fn create_vehicle(&self, vehicle: NewVehicle) -> Result<VehicleRecord, RepoError> {
        let sql = format!(
            "INSERT INTO vehicles (id, brand, model, year, color, price) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {VEHICLE_COLUMNS}"
        );

        let row = sqlx::query_as::<_, VehicleRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&vehicle.brand)
            .bind(&vehicle.model)
            .bind(vehicle.year)
            .bind(&vehicle.color)
            .bind(vehicle.price)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<VehicleRecord>, RepoError> {
        let sql = format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1 AND deleted_at IS NULL"
        );

        let row = sqlx::query_as::<_, VehicleRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(VehicleRecord::from))
    }

    async fn list_vehicles(
        &self,
        page: OffsetRequest,
    ) -> Result<OffsetPage<VehicleRecord>, RepoError> {
        let offset = i64::try_from(page.offset()).map_err(|_| RepoError::InvalidInput {
            message: "offset exceeds supported range".to_string(),
        })?;

        let sql = format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles \
             WHERE deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );

        let rows = sqlx::query_as::<_, VehicleRow>(&sql)
            .bind(i64::from(page.limit()))
            .bind(offset)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM vehicles WHERE deleted_at IS NULL")
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok(OffsetPage::new(
            rows.into_iter().map(VehicleRecord::from).collect(),
            convert_count(total)?,
        ))
    }

    async fn update_vehicle(&self, vehicle: &VehicleRecord) -> Result<VehicleRecord, RepoError> {
        let sql = format!(
            "UPDATE vehicles \
             SET brand = $2, model = $3, year = $4, color = $5, price = $6, updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {VEHICLE_COLUMNS}"
        );

        let row = sqlx::query_as::<_, VehicleRow>(&sql)
            .bind(vehicle.id)
            .bind(&vehicle.brand)
            .bind(&vehicle.model)
            .bind(vehicle.year)
            .bind(&vehicle.color)
            .bind(vehicle.price)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(VehicleRecord::from).ok_or(RepoError::NotFound)
    }

    async fn soft_delete_vehicle(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query(
            "UPDATE vehicles SET deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }
}
