//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

const DEV_JWT_SECRET: &str = "dev-only-jwt-secret-change-me";

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub bcrypt_cost: u32,
    pub cors_origins: Vec<String>,
    // Subida de imágenes
    pub base_url: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub max_upload_files: usize,
    // Generación de descripciones
    pub openai_api_key: Option<String>,
    pub openai_api_url: String,
    pub openai_model: String,
    pub description_timeout_secs: u64,
    // Admin inicial
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            port: 5000,
            host: "0.0.0.0".to_string(),
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expiration: 86_400,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            cors_origins: Vec::new(),
            base_url: "http://localhost:5000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 5 * 1024 * 1024,
            max_upload_files: 10,
            openai_api_key: None,
            openai_api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            openai_model: "gpt-3.5-turbo".to_string(),
            description_timeout_secs: 15,
            admin_username: None,
            admin_password: None,
        }
    }
}

impl EnvironmentConfig {
    /// Construir la configuración desde variables de entorno
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);

        let jwt_secret = match optional_var("JWT_SECRET") {
            Some(secret) => secret,
            None if environment == "production" => {
                return Err(anyhow!("JWT_SECRET must be set in production"));
            }
            None => defaults.jwt_secret,
        };

        Ok(Self {
            port: parse_var("PORT", defaults.port)?,
            host: env::var("HOST").unwrap_or(defaults.host),
            database_url: optional_var("DATABASE_URL"),
            jwt_secret,
            jwt_expiration: parse_var("JWT_EXPIRATION", defaults.jwt_expiration)?,
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost)?,
            cors_origins: optional_var("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            base_url: optional_var("BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            upload_dir: optional_var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            max_upload_files: parse_var("MAX_UPLOAD_FILES", defaults.max_upload_files)?,
            openai_api_key: optional_var("OPENAI_API_KEY"),
            openai_api_url: env::var("OPENAI_API_URL").unwrap_or(defaults.openai_api_url),
            openai_model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            description_timeout_secs: parse_var(
                "DESCRIPTION_TIMEOUT_SECS",
                defaults.description_timeout_secs,
            )?,
            admin_username: optional_var("ADMIN_USERNAME"),
            admin_password: optional_var("ADMIN_PASSWORD"),
            environment,
        })
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la dirección del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Tamaño máximo del cuerpo de una subida multipart
    pub fn upload_body_limit(&self) -> usize {
        // margen para cabeceras y límites multipart
        self.max_upload_bytes
            .saturating_mul(self.max_upload_files)
            .saturating_add(64 * 1024)
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub(crate) fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number, got '{}'", key, raw)),
        None => Ok(default),
    }
}
