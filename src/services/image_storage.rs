//! Almacenamiento de imágenes subidas
//!
//! Los archivos viven en `{upload_dir}/vehicles/{id}/` y se exponen como
//! `{base_url}/uploads/vehicles/{id}/{archivo}`. La liberación es
//! best-effort: los fallos se registran y nunca se propagan.

use axum::body::Bytes;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::utils::errors::{bad_request_error, AppError, AppResult};

/// Archivo recibido en un multipart antes de persistirse
#[derive(Debug, Clone)]
pub struct IncomingImage {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct ImageStorage {
    root: PathBuf,
    base_url: String,
    max_bytes: usize,
}

impl ImageStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: &str, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    /// Directorio servido bajo `/uploads`
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn vehicle_dir(&self, vehicle_id: Uuid) -> PathBuf {
        self.root.join("vehicles").join(vehicle_id.to_string())
    }

    /// Validar una imagen antes de escribir nada en disco
    pub fn check(&self, image: &IncomingImage) -> AppResult<()> {
        let is_image = image
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("image/"));
        if !is_image {
            return Err(bad_request_error("Only image files are allowed"));
        }
        if image.bytes.is_empty() {
            return Err(bad_request_error("Uploaded file is empty"));
        }
        if image.bytes.len() > self.max_bytes {
            return Err(AppError::BadRequest(format!(
                "File too large (max {} bytes)",
                self.max_bytes
            )));
        }
        Ok(())
    }

    /// Guardar una imagen y devolver su referencia pública
    pub async fn save(&self, vehicle_id: Uuid, image: &IncomingImage) -> AppResult<String> {
        self.check(image)?;

        let dir = self.vehicle_dir(vehicle_id);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::Internal(format!("cannot create {}: {}", dir.display(), e))
        })?;

        let file_name = generate_file_name(image);
        let path = dir.join(&file_name);
        tokio::fs::write(&path, &image.bytes).await.map_err(|e| {
            AppError::Internal(format!("cannot write {}: {}", path.display(), e))
        })?;

        log::info!("📸 Imagen guardada: {}", path.display());
        Ok(self.public_url(vehicle_id, &file_name))
    }

    pub fn public_url(&self, vehicle_id: Uuid, file_name: &str) -> String {
        format!("{}/uploads/vehicles/{}/{}", self.base_url, vehicle_id, file_name)
    }

    /// Ruta local de una referencia, solo si apunta al directorio del vehículo
    pub fn local_path_for(&self, vehicle_id: Uuid, reference: &str) -> Option<PathBuf> {
        let marker = format!("/uploads/vehicles/{}/", vehicle_id);
        let start = reference.find(&marker)? + marker.len();
        let tail = reference[start..]
            .split(['?', '#'])
            .next()
            .unwrap_or_default();

        if !is_safe_file_name(tail) {
            return None;
        }
        Some(self.vehicle_dir(vehicle_id).join(tail))
    }

    /// Borrar el archivo de una referencia (best-effort)
    pub async fn release(&self, vehicle_id: Uuid, reference: &str) {
        let Some(path) = self.local_path_for(vehicle_id, reference) else {
            log::debug!("Referencia externa, nada que borrar: {}", reference);
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => log::info!("🗑️ Imagen borrada: {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("⚠️ Imagen ya no existe: {}", path.display())
            }
            Err(e) => log::warn!("⚠️ No se pudo borrar {}: {}", path.display(), e),
        }
    }

    /// Borrar todas las imágenes y el directorio del vehículo (best-effort)
    pub async fn release_all(&self, vehicle_id: Uuid, references: &[String]) {
        for reference in references {
            self.release(vehicle_id, reference).await;
        }

        let dir = self.vehicle_dir(vehicle_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => log::info!("🗑️ Directorio de imágenes borrado: {}", dir.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!("⚠️ No se pudo borrar {}: {}", dir.display(), e),
        }
    }
}

fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

fn generate_file_name(image: &IncomingImage) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::random::<u32>() % 1_000_000_000;
    match extension_for(image) {
        Some(ext) => format!("{}-{}.{}", millis, suffix, ext),
        None => format!("{}-{}", millis, suffix),
    }
}

/// Extensión del nombre original o, en su defecto, del content type
fn extension_for(image: &IncomingImage) -> Option<String> {
    let from_name = image
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str());
    let from_type = image
        .content_type
        .as_deref()
        .and_then(|ct| ct.split('/').nth(1))
        .map(|subtype| subtype.split(['+', ';']).next().unwrap_or_default());

    from_name
        .or(from_type)
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
}
