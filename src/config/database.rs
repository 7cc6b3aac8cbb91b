//! Configuración de base de datos
//!
//! Tamaño y tiempos del pool de PostgreSQL. Los valores por defecto se
//! pueden ajustar con `DB_MAX_CONNECTIONS`, `DB_MIN_CONNECTIONS` y
//! `DB_ACQUIRE_TIMEOUT_SECS`.

use anyhow::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::config::environment::parse_var;

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(3600),
        }
    }

    /// `new` + overrides del entorno
    pub fn from_env(url: impl Into<String>) -> Result<Self> {
        let base = Self::new(url);
        let max_connections = parse_var("DB_MAX_CONNECTIONS", base.max_connections)?.max(1);
        let min_connections = parse_var("DB_MIN_CONNECTIONS", base.min_connections)?.min(max_connections);
        let acquire_secs = parse_var("DB_ACQUIRE_TIMEOUT_SECS", base.acquire_timeout.as_secs())?;

        Ok(Self {
            max_connections,
            min_connections,
            acquire_timeout: Duration::from_secs(acquire_secs),
            ..base
        })
    }

    pub async fn create_pool(&self) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
            .connect(&self.url)
            .await
    }
}
