//! Locks por vehículo
//!
//! Serializa las mutaciones (update, imágenes, delete) de un mismo vehículo
//! dentro del proceso. Las entradas sin usuarios se podan al pedir un lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct VehicleLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl VehicleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Espera hasta obtener el lock exclusivo del vehículo
    pub async fn lock(&self, vehicle_id: Uuid) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            map.retain(|id, m| *id == vehicle_id || Arc::strong_count(m) > 1);
            map.entry(vehicle_id).or_default().clone()
        };
        mutex.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or_default()
    }
}
