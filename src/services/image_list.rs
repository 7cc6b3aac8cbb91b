//! Reglas de la lista de imágenes de un vehículo
//!
//! La lista es una secuencia ordenada de referencias (URLs o data-URIs); la
//! primera es la imagen principal. Las posiciones solo tienen sentido justo
//! después de leer la lista dentro de la misma operación.

use serde_json::Value;

use crate::utils::errors::AppError;

/// Materializar la columna `images` como lista de strings.
///
/// Acepta el array nativo o un array serializado dentro de un string (filas
/// corruptas por un bug de serialización antiguo). Cualquier otra forma, o un
/// string que no decodifica a un array, produce una lista vacía. Nunca falla.
/// Solo se usa al leer: las escrituras siempre guardan un array nativo.
pub fn normalize(raw: &Value) -> Vec<String> {
    match raw {
        Value::Array(items) => collect_strings(items),
        Value::String(encoded) => match serde_json::from_str::<Value>(encoded) {
            Ok(Value::Array(items)) => {
                log::warn!("⚠️ Columna images almacenada como string; normalizando");
                collect_strings(&items)
            }
            Ok(_) | Err(_) => {
                log::warn!("⚠️ No se pudo decodificar la columna images; usando lista vacía");
                Vec::new()
            }
        },
        Value::Null => Vec::new(),
        _ => {
            log::warn!("⚠️ Columna images con forma inesperada; usando lista vacía");
            Vec::new()
        }
    }
}

fn collect_strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.as_str().map(str::to_string))
        .collect()
}

/// Añadir entradas al final conservando el orden de ambas listas
pub fn append(mut existing: Vec<String>, new_entries: &[String]) -> Vec<String> {
    existing.extend_from_slice(new_entries);
    existing
}

/// Interpretar el índice recibido en la ruta
pub fn parse_index(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::InvalidIndex(raw.to_string()))
}

/// Eliminar la entrada en `index` desplazando las siguientes.
///
/// Con un índice fuera de rango la lista no se modifica.
pub fn remove_at(images: &mut Vec<String>, index: i64) -> Result<String, AppError> {
    if index < 0 || index >= images.len() as i64 {
        return Err(AppError::InvalidIndex(index.to_string()));
    }
    Ok(images.remove(index as usize))
}
