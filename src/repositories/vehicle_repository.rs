//! Repositorio de vehículos
//!
//! `VehicleStore` es la frontera de persistencia; `PgVehicleRepository` la
//! implementa sobre PostgreSQL. Los filtros dinámicos se construyen con
//! `QueryBuilder` y parámetros enlazados; el orden sale del enum whitelisted.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::vehicle::{Vehicle, VehicleFields, VehicleRow};
use crate::services::vehicle_query::VehicleQuery;
use crate::utils::errors::AppError;

const VEHICLE_COLUMNS: &str = "id, vehicle_type, brand, model_name, color, engine_size, year, \
     price, images, description, creator_id, created_at, updated_at";

#[async_trait]
pub trait VehicleStore: Send + Sync {
    async fn create(&self, fields: VehicleFields, creator_id: Option<Uuid>) -> Result<Vehicle, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError>;

    /// Página de resultados + total sin ventana
    async fn search(&self, query: &VehicleQuery) -> Result<(Vec<Vehicle>, i64), AppError>;

    /// Sobrescribe los campos escribibles; `None` si el vehículo no existe
    async fn update(&self, id: Uuid, fields: VehicleFields) -> Result<Option<Vehicle>, AppError>;

    async fn set_images(&self, id: Uuid, images: &[String]) -> Result<Option<Vehicle>, AppError>;

    /// `true` si se borró una fila
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleStore for PgVehicleRepository {
    async fn create(&self, fields: VehicleFields, creator_id: Option<Uuid>) -> Result<Vehicle, AppError> {
        let sql = format!(
            r#"
            INSERT INTO vehicles
                (id, vehicle_type, brand, model_name, color, engine_size, year, price, images, description, creator_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        );

        let row = sqlx::query_as::<_, VehicleRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(fields.vehicle_type)
            .bind(&fields.brand)
            .bind(&fields.model_name)
            .bind(&fields.color)
            .bind(&fields.engine_size)
            .bind(fields.year)
            .bind(fields.price)
            .bind(Json(&fields.images))
            .bind(&fields.description)
            .bind(creator_id)
            .fetch_one(&self.pool)
            .await?;

        log::info!("✅ Vehículo creado: {}", row.id);
        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError> {
        let sql = format!("SELECT {} FROM vehicles WHERE id = $1", VEHICLE_COLUMNS);
        let row = sqlx::query_as::<_, VehicleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Vehicle::from))
    }

    async fn search(&self, query: &VehicleQuery) -> Result<(Vec<Vehicle>, i64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM vehicles");
        query.push_where(&mut count);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM vehicles", VEHICLE_COLUMNS));
        query.push_where(&mut select);
        query.push_window(&mut select);
        let rows: Vec<VehicleRow> = select.build_query_as().fetch_all(&self.pool).await?;

        log::debug!("🔍 {} vehículos en la página {} (total {})", rows.len(), query.page, total);
        Ok((rows.into_iter().map(Vehicle::from).collect(), total))
    }

    async fn update(&self, id: Uuid, fields: VehicleFields) -> Result<Option<Vehicle>, AppError> {
        let sql = format!(
            r#"
            UPDATE vehicles
            SET vehicle_type = $2, brand = $3, model_name = $4, color = $5, engine_size = $6,
                year = $7, price = $8, images = $9, description = $10, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            VEHICLE_COLUMNS
        );

        let row = sqlx::query_as::<_, VehicleRow>(&sql)
            .bind(id)
            .bind(fields.vehicle_type)
            .bind(&fields.brand)
            .bind(&fields.model_name)
            .bind(&fields.color)
            .bind(&fields.engine_size)
            .bind(fields.year)
            .bind(fields.price)
            .bind(Json(&fields.images))
            .bind(&fields.description)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Vehicle::from))
    }

    async fn set_images(&self, id: Uuid, images: &[String]) -> Result<Option<Vehicle>, AppError> {
        let sql = format!(
            "UPDATE vehicles SET images = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            VEHICLE_COLUMNS
        );

        let row = sqlx::query_as::<_, VehicleRow>(&sql)
            .bind(id)
            .bind(Json(images))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Vehicle::from))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
