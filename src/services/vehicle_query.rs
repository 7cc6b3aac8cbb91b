//! Constructor de consultas de vehículos
//!
//! Traduce los parámetros del query string en filtros, orden y ventana de
//! paginación validados. La misma consulta sirve para generar SQL
//! (`push_where` / `push_window`) y para evaluar registros en memoria
//! (`VehicleFilters::matches` / `VehicleQuery::sort`), de modo que ambos
//! almacenes devuelven las mismas páginas.

use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};
use std::cmp::Ordering;

use crate::dto::vehicle_dto::{PaginationSummary, VehicleQueryParams};
use crate::models::vehicle::{Vehicle, VehicleType};
use crate::utils::errors::{validation_error, AppError};
use crate::utils::validation::{non_blank_str, parse_optional};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Campos por los que se permite ordenar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Price,
    Year,
    Brand,
    ModelName,
    Color,
    EngineSize,
    VehicleType,
}

impl SortField {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "createdAt" | "created_at" => Some(SortField::CreatedAt),
            "updatedAt" | "updated_at" => Some(SortField::UpdatedAt),
            "price" => Some(SortField::Price),
            "year" => Some(SortField::Year),
            "brand" => Some(SortField::Brand),
            "modelName" | "model_name" => Some(SortField::ModelName),
            "color" => Some(SortField::Color),
            "engineSize" | "engine_size" => Some(SortField::EngineSize),
            "vehicleType" | "vehicle_type" => Some(SortField::VehicleType),
            _ => None,
        }
    }

    /// Columna SQL; nunca proviene del cliente
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Price => "price",
            SortField::Year => "year",
            SortField::Brand => "brand",
            SortField::ModelName => "model_name",
            SortField::Color => "color",
            SortField::EngineSize => "engine_size",
            SortField::VehicleType => "vehicle_type",
        }
    }

    /// Expresión de ORDER BY; textos en minúsculas y orden por bytes
    pub fn order_expression(&self) -> String {
        match self {
            SortField::Brand | SortField::ModelName | SortField::Color | SortField::EngineSize => {
                format!("LOWER({}) COLLATE \"C\"", self.column())
            }
            _ => self.column().to_string(),
        }
    }

    fn compare(&self, a: &Vehicle, b: &Vehicle) -> Ordering {
        match self {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Price => a.price.cmp(&b.price),
            SortField::Year => a.year.cmp(&b.year),
            SortField::Brand => text_order(&a.brand, &b.brand),
            SortField::ModelName => text_order(&a.model_name, &b.model_name),
            SortField::Color => text_order(&a.color, &b.color),
            SortField::EngineSize => text_order(&a.engine_size, &b.engine_size),
            SortField::VehicleType => a.vehicle_type.cmp(&b.vehicle_type),
        }
    }
}

fn text_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(SortOrder::Asc),
            "DESC" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Predicados opcionales; todos los presentes se combinan con AND
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleFilters {
    pub vehicle_type: Option<VehicleType>,
    pub brand: Option<String>,
    pub model_name: Option<String>,
    pub color: Option<String>,
    pub engine_size: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
}

impl VehicleFilters {
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        if let Some(vehicle_type) = self.vehicle_type {
            if vehicle.vehicle_type != vehicle_type {
                return false;
            }
        }

        let substrings = [
            (&self.brand, &vehicle.brand),
            (&self.model_name, &vehicle.model_name),
            (&self.color, &vehicle.color),
            (&self.engine_size, &vehicle.engine_size),
        ];
        for (needle, haystack) in substrings {
            if let Some(needle) = needle {
                if !contains_ignore_case(haystack, needle) {
                    return false;
                }
            }
        }

        if self.min_price.is_some_and(|min| vehicle.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| vehicle.price > max) {
            return false;
        }
        if self.min_year.is_some_and(|min| vehicle.year < min) {
            return false;
        }
        if self.max_year.is_some_and(|max| vehicle.year > max) {
            return false;
        }

        true
    }
}

/// Consulta validada: filtros + orden + ventana de paginación
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleQuery {
    pub filters: VehicleFilters,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    pub page: i64,
    pub limit: i64,
}

impl Default for VehicleQuery {
    fn default() -> Self {
        Self {
            filters: VehicleFilters::default(),
            sort_field: SortField::default(),
            sort_order: SortOrder::default(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl VehicleQuery {
    /// Validar los parámetros crudos del query string
    pub fn from_params(params: &VehicleQueryParams) -> Result<Self, AppError> {
        let page = parse_optional::<i64>("page", params.page.as_deref(), "page must be an integer")?
            .unwrap_or(DEFAULT_PAGE)
            .max(1);

        let limit = parse_optional::<i64>("limit", params.limit.as_deref(), "limit must be an integer")?
            .unwrap_or(DEFAULT_LIMIT)
            .clamp(1, MAX_LIMIT);

        let sort_field = match non_blank_str(params.sort_by.as_deref()) {
            None => SortField::default(),
            Some(raw) => SortField::parse(raw)
                .ok_or_else(|| validation_error("sortBy", "unknown sort field"))?,
        };

        let sort_order = match non_blank_str(params.sort_order.as_deref()) {
            None => SortOrder::default(),
            Some(raw) => SortOrder::parse(raw)
                .ok_or_else(|| validation_error("sortOrder", "sortOrder must be ASC or DESC"))?,
        };

        let filters = VehicleFilters {
            vehicle_type: parse_optional(
                "vehicleType",
                params.vehicle_type.as_deref(),
                "vehicleType must be one of Car, Bike, SUV",
            )?,
            brand: owned(params.brand.as_deref()),
            model_name: owned(params.model_name.as_deref()),
            color: owned(params.color.as_deref()),
            engine_size: owned(params.engine_size.as_deref()),
            min_price: parse_optional("minPrice", params.min_price.as_deref(), "minPrice must be a number")?,
            max_price: parse_optional("maxPrice", params.max_price.as_deref(), "maxPrice must be a number")?,
            min_year: parse_optional("minYear", params.min_year.as_deref(), "minYear must be an integer")?,
            max_year: parse_optional("maxYear", params.max_year.as_deref(), "maxYear must be an integer")?,
        };

        Ok(Self {
            filters,
            sort_field,
            sort_order,
            page,
            limit,
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Añadir la cláusula WHERE con parámetros enlazados
    pub fn push_where(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        let filters = &self.filters;
        builder.push(" WHERE TRUE");

        if let Some(vehicle_type) = filters.vehicle_type {
            builder.push(" AND vehicle_type = ").push_bind(vehicle_type);
        }

        let substrings = [
            ("brand", &filters.brand),
            ("model_name", &filters.model_name),
            ("color", &filters.color),
            ("engine_size", &filters.engine_size),
        ];
        for (column, value) in substrings {
            if let Some(value) = value {
                builder
                    .push(" AND ")
                    .push(column)
                    .push(" ILIKE ")
                    .push_bind(like_pattern(value));
            }
        }

        if let Some(min_price) = filters.min_price {
            builder.push(" AND price >= ").push_bind(min_price);
        }
        if let Some(max_price) = filters.max_price {
            builder.push(" AND price <= ").push_bind(max_price);
        }
        if let Some(min_year) = filters.min_year {
            builder.push(" AND year >= ").push_bind(min_year);
        }
        if let Some(max_year) = filters.max_year {
            builder.push(" AND year <= ").push_bind(max_year);
        }
    }

    /// Añadir ORDER BY + LIMIT/OFFSET; el id desempata para páginas estables
    pub fn push_window(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        let direction = self.sort_order.as_sql();
        builder
            .push(" ORDER BY ")
            .push(self.sort_field.order_expression())
            .push(" ")
            .push(direction)
            .push(", id ")
            .push(direction)
            .push(" LIMIT ")
            .push_bind(self.limit)
            .push(" OFFSET ")
            .push_bind(self.offset());
    }

    /// Ordenar en memoria con la misma semántica que `push_window`
    pub fn sort(&self, vehicles: &mut [Vehicle]) {
        let field = self.sort_field;
        let order = self.sort_order;
        vehicles.sort_by(|a, b| {
            let ordering = field.compare(a, b).then_with(|| a.id.cmp(&b.id));
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }

    pub fn summary(&self, total: i64) -> PaginationSummary {
        PaginationSummary {
            total,
            page: self.page,
            limit: self.limit,
            total_pages: total_pages(total, self.limit),
        }
    }
}

/// `ceil(total / limit)`; `limit` se fuerza a ≥ 1
pub fn total_pages(total: i64, limit: i64) -> i64 {
    let limit = limit.max(1);
    let total = total.max(0);
    (total + limit - 1) / limit
}

/// Patrón ILIKE "contiene" con comodines del usuario escapados
pub fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn owned(value: Option<&str>) -> Option<String> {
    non_blank_str(value).map(str::to_string)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
