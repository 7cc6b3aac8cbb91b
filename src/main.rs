use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vehicle_marketplace::build_router;
use vehicle_marketplace::config::{DatabaseConfig, EnvironmentConfig};
use vehicle_marketplace::database;
use vehicle_marketplace::models::user::ADMIN_ROLE;
use vehicle_marketplace::repositories::{
    MemoryUserRepository, MemoryVehicleRepository, PgUserRepository, PgVehicleRepository,
    UserStore, VehicleStore,
};
use vehicle_marketplace::services::OpenAiDescriptionGenerator;
use vehicle_marketplace::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("🚗 Vehicle Marketplace API");
    info!("=========================");

    let config = EnvironmentConfig::from_env().context("invalid configuration")?;
    info!("⚙️ Entorno: {}", config.environment);

    // Almacenes: PostgreSQL si hay DATABASE_URL, memoria si no
    let (vehicles, users): (Arc<dyn VehicleStore>, Arc<dyn UserStore>) =
        match &config.database_url {
            Some(url) => {
                let pool = match database::connect(&DatabaseConfig::from_env(url.clone())?).await {
                    Ok(pool) => pool,
                    Err(e) => {
                        error!("❌ Error conectando a la base de datos: {}", e);
                        return Err(e);
                    }
                };
                let vehicles: Arc<dyn VehicleStore> = Arc::new(PgVehicleRepository::new(pool.clone()));
                let users: Arc<dyn UserStore> = Arc::new(PgUserRepository::new(pool));
                (vehicles, users)
            }
            None => {
                warn!("⚠️ DATABASE_URL no definida, usando almacenamiento en memoria");
                let vehicles: Arc<dyn VehicleStore> = Arc::new(MemoryVehicleRepository::new());
                let users: Arc<dyn UserStore> = Arc::new(MemoryUserRepository::new());
                (vehicles, users)
            }
        };

    let generator = Arc::new(OpenAiDescriptionGenerator::new(
        config.openai_api_key.clone(),
        config.openai_api_url.clone(),
        config.openai_model.clone(),
    ));
    if config.openai_api_key.is_none() {
        warn!("⚠️ OPENAI_API_KEY no definida, se usarán descripciones de respaldo");
    }

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("cannot create upload dir {}", config.upload_dir.display()))?;

    if config.is_production() && config.cors_origins.is_empty() {
        warn!("⚠️ CORS_ORIGINS vacío en producción: se aceptan todos los orígenes");
    }

    let addr: SocketAddr = config
        .server_url()
        .parse()
        .context("invalid HOST/PORT")?;

    let state = AppState::new(config, vehicles, users, generator);
    bootstrap_admin(&state).await?;

    let app = build_router(state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("   POST /api/auth/login - Login");
    info!("   GET  /api/auth/me - Usuario actual");
    info!("🚗 Endpoints - Vehicles:");
    info!("   GET    /api/vehicles - Listar con filtros y paginación");
    info!("   GET    /api/vehicles/:id - Obtener vehículo");
    info!("   POST   /api/vehicles - Crear vehículo");
    info!("   PUT    /api/vehicles/:id - Actualizar vehículo");
    info!("   DELETE /api/vehicles/:id - Eliminar vehículo");
    info!("   POST   /api/vehicles/:id/images - Subir imágenes");
    info!("   DELETE /api/vehicles/:id/images/:index - Borrar imagen");
    info!("   POST   /api/vehicles/generate-description - Generar descripción");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Crear el admin inicial si está configurado y no existe
async fn bootstrap_admin(state: &AppState) -> Result<()> {
    let (Some(username), Some(password)) = (
        state.config.admin_username.clone(),
        state.config.admin_password.clone(),
    ) else {
        return Ok(());
    };

    if state.users.find_by_username(&username).await?.is_some() {
        info!("👤 Admin '{}' ya existe", username);
        return Ok(());
    }

    let hash = state.auth.hash_password(password).await?;
    state.users.create(&username, &hash, ADMIN_ROLE).await?;
    info!("✅ Admin '{}' creado", username);
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
