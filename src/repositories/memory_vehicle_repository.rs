//! Almacén de vehículos en memoria
//!
//! Misma semántica que el repositorio PostgreSQL (filtros, orden, ventana).
//! Guarda filas crudas para que la lectura pase por la misma normalización
//! de `images` que las filas de la base de datos.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::vehicle::{Vehicle, VehicleFields, VehicleRow};
use crate::repositories::vehicle_repository::VehicleStore;
use crate::services::vehicle_query::VehicleQuery;
use crate::utils::errors::AppError;

#[derive(Default)]
pub struct MemoryVehicleRepository {
    rows: RwLock<HashMap<Uuid, VehicleRow>>,
}

impl MemoryVehicleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insertar una fila tal cual, sin validar `images`
    pub async fn insert_row(&self, row: VehicleRow) {
        self.rows.write().await.insert(row.id, row);
    }
}

fn apply(row: &mut VehicleRow, fields: VehicleFields) {
    row.vehicle_type = fields.vehicle_type;
    row.brand = fields.brand;
    row.model_name = fields.model_name;
    row.color = fields.color;
    row.engine_size = fields.engine_size;
    row.year = fields.year;
    row.price = fields.price;
    row.images = serde_json::json!(fields.images);
    row.description = fields.description;
    row.updated_at = Utc::now();
}

#[async_trait]
impl VehicleStore for MemoryVehicleRepository {
    async fn create(&self, fields: VehicleFields, creator_id: Option<Uuid>) -> Result<Vehicle, AppError> {
        let now = Utc::now();
        let row = VehicleRow {
            id: Uuid::new_v4(),
            vehicle_type: fields.vehicle_type,
            brand: fields.brand,
            model_name: fields.model_name,
            color: fields.color,
            engine_size: fields.engine_size,
            year: fields.year,
            price: fields.price,
            images: serde_json::json!(fields.images),
            description: fields.description,
            creator_id,
            created_at: now,
            updated_at: now,
        };

        self.rows.write().await.insert(row.id, row.clone());
        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>, AppError> {
        Ok(self.rows.read().await.get(&id).cloned().map(Vehicle::from))
    }

    async fn search(&self, query: &VehicleQuery) -> Result<(Vec<Vehicle>, i64), AppError> {
        let mut matching: Vec<Vehicle> = self
            .rows
            .read()
            .await
            .values()
            .cloned()
            .map(Vehicle::from)
            .filter(|vehicle| query.filters.matches(vehicle))
            .collect();

        let total = matching.len() as i64;
        query.sort(&mut matching);

        let page = matching
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit).unwrap_or(0))
            .collect();

        Ok((page, total))
    }

    async fn update(&self, id: Uuid, fields: VehicleFields) -> Result<Option<Vehicle>, AppError> {
        let mut rows = self.rows.write().await;
        Ok(rows.get_mut(&id).map(|row| {
            apply(row, fields);
            Vehicle::from(row.clone())
        }))
    }

    async fn set_images(&self, id: Uuid, images: &[String]) -> Result<Option<Vehicle>, AppError> {
        let mut rows = self.rows.write().await;
        Ok(rows.get_mut(&id).map(|row| {
            row.images = serde_json::json!(images);
            row.updated_at = Utc::now();
            Vehicle::from(row.clone())
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vehicle::VehicleType;
    use crate::services::vehicle_query::{SortField, SortOrder, VehicleFilters};
    use rust_decimal::Decimal;

    fn fields(brand: &str, model: &str, year: i32, price: i64) -> VehicleFields {
        VehicleFields {
            vehicle_type: VehicleType::Car,
            brand: brand.to_string(),
            model_name: model.to_string(),
            color: "Red".to_string(),
            engine_size: "1.8L".to_string(),
            year,
            price: Decimal::new(price, 0),
            images: vec![],
            description: None,
        }
    }

    #[tokio::test]
    async fn test_crud_cycle() {
        let store = MemoryVehicleRepository::new();
        let created = store.create(fields("Toyota", "Corolla", 2019, 18000), None).await.unwrap();
        assert_eq!(store.find_by_id(created.id).await.unwrap(), Some(created.clone()));

        let mut changed = VehicleFields::from(&created);
        changed.color = "Black".to_string();
        let updated = store.update(created.id, changed).await.unwrap().unwrap();
        assert_eq!(updated.color, "Black");
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);

        assert!(store.delete(created.id).await.unwrap());
        assert!(!store.delete(created.id).await.unwrap());
        assert!(store.update(created.id, fields("X", "Y", 2000, 1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_filters_counts_and_pages() {
        let store = MemoryVehicleRepository::new();
        for (brand, model, year, price) in [
            ("Toyota", "Camry", 2020, 25000),
            ("Toyota", "Corolla", 2018, 17000),
            ("Honda", "Civic", 2021, 22000),
            ("Ford", "Focus", 2015, 9000),
        ] {
            store.create(fields(brand, model, year, price), None).await.unwrap();
        }

        let query = VehicleQuery {
            filters: VehicleFilters {
                min_year: Some(2018),
                ..VehicleFilters::default()
            },
            sort_field: SortField::Price,
            sort_order: SortOrder::Asc,
            page: 2,
            limit: 2,
        };
        let (page, total) = store.search(&query).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].model_name, "Camry");

        let beyond = VehicleQuery { page: 9, ..query };
        let (page, total) = store.search(&beyond).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_corrupted_images_are_normalized_on_read() {
        let store = MemoryVehicleRepository::new();
        let created = store.create(fields("Kia", "Rio", 2017, 8000), None).await.unwrap();

        let mut row = VehicleRow {
            images: serde_json::json!("[\"a.jpg\",\"b.jpg\"]"),
            ..sample_row(&created)
        };
        store.insert_row(row.clone()).await;
        let read = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(read.images, vec!["a.jpg", "b.jpg"]);

        row.images = serde_json::json!({ "not": "a list" });
        store.insert_row(row).await;
        let read = store.find_by_id(created.id).await.unwrap().unwrap();
        assert!(read.images.is_empty());
    }

    fn sample_row(vehicle: &Vehicle) -> VehicleRow {
        VehicleRow {
            id: vehicle.id,
            vehicle_type: vehicle.vehicle_type,
            brand: vehicle.brand.clone(),
            model_name: vehicle.model_name.clone(),
            color: vehicle.color.clone(),
            engine_size: vehicle.engine_size.clone(),
            year: vehicle.year,
            price: vehicle.price,
            images: serde_json::json!(vehicle.images),
            description: vehicle.description.clone(),
            creator_id: vehicle.creator_id,
            created_at: vehicle.created_at,
            updated_at: vehicle.updated_at,
        }
    }
}
