//! Servicio de generación de descripciones
//!
//! Produce un texto de venta a partir de los atributos del vehículo usando
//! una API de completions compatible con OpenAI. Toda llamada corre bajo un
//! timeout; el controlador decide qué hacer si falla.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::vehicle::{VehicleFields, VehicleType};

pub const SYSTEM_PROMPT: &str =
    "You are a professional car salesman writing compelling vehicle descriptions.";
pub const EMPTY_COMPLETION: &str = "Description not available";
const MAX_TOKENS: u32 = 200;
const TEMPERATURE: f32 = 0.7;

/// Los siete atributos que alimentan el prompt
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleAttributes {
    pub vehicle_type: VehicleType,
    pub brand: String,
    pub model_name: String,
    pub color: String,
    pub engine_size: String,
    pub year: i32,
    pub price: Decimal,
}

impl From<&VehicleFields> for VehicleAttributes {
    fn from(fields: &VehicleFields) -> Self {
        Self {
            vehicle_type: fields.vehicle_type,
            brand: fields.brand.clone(),
            model_name: fields.model_name.clone(),
            color: fields.color.clone(),
            engine_size: fields.engine_size.clone(),
            year: fields.year,
            price: fields.price,
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("description generator is not configured")]
    NotConfigured,

    #[error("description generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("request to completion API failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("completion API returned an unexpected response: {0}")]
    InvalidResponse(String),
}

/// Frontera con el proveedor de texto
#[async_trait]
pub trait DescriptionGenerator: Send + Sync {
    async fn generate(&self, attributes: &VehicleAttributes) -> Result<String, GenerationError>;
}

pub fn build_prompt(attributes: &VehicleAttributes) -> String {
    format!(
        "Generate a creative and engaging sales description for a {} {} {} {}. \
         Key features: {} color, {} engine. Price: ${}. \
         Make it appealing and highlight the vehicle's strengths. Keep it under 200 words.",
        attributes.year,
        attributes.brand,
        attributes.model_name,
        attributes.vehicle_type,
        attributes.color,
        attributes.engine_size,
        attributes.price.normalize(),
    )
}

/// Texto determinista usado cuando la generación falla al crear
pub fn fallback_description(attributes: &VehicleAttributes) -> String {
    format!(
        "{} {} {} - A great {} option!",
        attributes.year,
        attributes.brand,
        attributes.model_name,
        attributes.vehicle_type.as_str().to_lowercase()
    )
}

// Wire types de chat completions
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Cliente de la API de chat completions
pub struct OpenAiDescriptionGenerator {
    client: Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
}

impl OpenAiDescriptionGenerator {
    pub fn new(api_key: Option<String>, api_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_url: api_url.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl DescriptionGenerator for OpenAiDescriptionGenerator {
    async fn generate(&self, attributes: &VehicleAttributes) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::NotConfigured)?;
        let prompt = build_prompt(attributes);

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: &prompt },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        log::info!(
            "🤖 Generando descripción para {} {} {}",
            attributes.year,
            attributes.brand,
            attributes.model_name
        );

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::InvalidResponse(format!("HTTP {}: {}", status, body)));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .unwrap_or_else(|| EMPTY_COMPLETION.to_string());

        Ok(text)
    }
}

/// Generador + timeout compartido por los controladores
#[derive(Clone)]
pub struct DescriptionService {
    generator: Arc<dyn DescriptionGenerator>,
    timeout: Duration,
}

impl DescriptionService {
    pub fn new(generator: Arc<dyn DescriptionGenerator>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub async fn generate(&self, attributes: &VehicleAttributes) -> Result<String, GenerationError> {
        match tokio::time::timeout(self.timeout, self.generator.generate(attributes)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(self.timeout)),
        }
    }

    /// Generar o, si falla, devolver el texto de respaldo
    pub async fn generate_or_fallback(&self, attributes: &VehicleAttributes) -> String {
        match self.generate(attributes).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("⚠️ Generación de descripción falló, usando texto de respaldo: {}", e);
                fallback_description(attributes)
            }
        }
    }
}
