//! Servicio de autenticación
//!
//! Emite y verifica JWT HS256 y encapsula bcrypt. El hashing corre en
//! `spawn_blocking` para no bloquear el runtime.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::models::auth::{AuthenticatedUser, JwtClaims};
use crate::models::user::User;
use crate::repositories::user_repository::UserStore;
use crate::utils::errors::{AppError, AppResult};

pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: u64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(secret: &str, expiration_secs: u64, bcrypt_cost: u32) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs,
            bcrypt_cost,
        }
    }

    /// Genera un token de acceso para el usuario
    pub fn issue_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp().max(0) as usize;
        let claims = JwtClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.clone(),
            iat: now,
            exp: now + self.expiration_secs as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Jwt(format!("Error generating access token: {}", e)))
    }

    /// Valida un token y devuelve el usuario que contiene
    pub fn verify_token(&self, token: &str) -> AppResult<AuthenticatedUser> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map_err(|e| AppError::Jwt(e.to_string()))?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::Jwt("subject is not a valid id".to_string()))?;

        Ok(AuthenticatedUser {
            user_id,
            username: data.claims.username,
            role: data.claims.role,
        })
    }

    pub async fn hash_password(&self, password: String) -> AppResult<String> {
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("hash task failed: {}", e)))?
            .map_err(|e| AppError::Hash(e.to_string()))
    }

    pub async fn verify_password(&self, password: String, hash: String) -> AppResult<bool> {
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("verify task failed: {}", e)))?
            .map_err(|e| AppError::Hash(e.to_string()))
    }

    /// Comprobar credenciales; cualquier fallo es "Invalid credentials"
    pub async fn authenticate(
        &self,
        users: &dyn UserStore,
        username: &str,
        password: &str,
    ) -> AppResult<User> {
        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let user = users.find_by_username(username).await?.ok_or_else(invalid)?;
        let matches = self
            .verify_password(password.to_string(), user.password_hash.clone())
            .await
            .unwrap_or(false);

        if !matches {
            log::warn!("🔒 Login fallido para '{}'", username);
            return Err(invalid());
        }

        log::info!("🔑 Login correcto para '{}'", username);
        Ok(user)
    }
}
