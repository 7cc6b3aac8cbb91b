use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        DefaultBodyLimit, Path, State,
    },
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};

use crate::controllers::vehicle_controller::parse_vehicle_id;
use crate::controllers::{ImageController, VehicleController};
use crate::dto::vehicle_dto::{
    CreateVehicleRequest, DescriptionResponse, GenerateDescriptionRequest, ImageDeleteResponse,
    ImageUploadResponse, MessageResponse, UpdateVehicleRequest, VehicleListResponse,
    VehicleMessageResponse, VehicleQueryParams,
};
use crate::middleware::require_auth;
use crate::models::auth::AuthenticatedUser;
use crate::models::vehicle::Vehicle;
use crate::services::image_storage::IncomingImage;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::extract::{ApiJson, ApiQuery};

/// Nombre del campo multipart que contiene los archivos
const IMAGES_FIELD: &str = "images";

/// Lecturas públicas; escrituras detrás de `require_auth`
pub fn create_vehicle_router(state: AppState) -> Router<AppState> {
    let auth = middleware::from_fn_with_state(state.clone(), require_auth);
    let upload_limit = DefaultBodyLimit::max(state.config.upload_body_limit());

    Router::new()
        .route(
            "/",
            get(list_vehicles).merge(post(create_vehicle).route_layer(auth.clone())),
        )
        .route(
            "/generate-description",
            post(generate_description).route_layer(auth.clone()),
        )
        .route(
            "/:id",
            get(get_vehicle)
                .merge(put(update_vehicle).route_layer(auth.clone()))
                .merge(delete(delete_vehicle).route_layer(auth.clone())),
        )
        .route(
            "/:id/images",
            post(upload_images).route_layer(auth.clone()).layer(upload_limit),
        )
        // Alias usado por el cliente web
        .route(
            "/:id/upload-images",
            post(upload_images).route_layer(auth.clone()).layer(upload_limit),
        )
        .route("/:id/images/:index", delete(delete_image).route_layer(auth))
}

async fn list_vehicles(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<VehicleQueryParams>,
) -> Result<Json<VehicleListResponse>, AppError> {
    let controller = VehicleController::new(&state);
    let response = controller.list(&params).await?;
    Ok(Json(response))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vehicle>, AppError> {
    let controller = VehicleController::new(&state);
    let vehicle = controller.get_by_id(parse_vehicle_id(&id)?).await?;
    Ok(Json(vehicle))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<VehicleMessageResponse>), AppError> {
    let controller = VehicleController::new(&state);
    let response = controller.create(&user, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateVehicleRequest>,
) -> Result<Json<VehicleMessageResponse>, AppError> {
    let controller = VehicleController::new(&state);
    let response = controller.update(parse_vehicle_id(&id)?, request).await?;
    Ok(Json(response))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let controller = VehicleController::new(&state);
    let response = controller.delete(parse_vehicle_id(&id)?).await?;
    Ok(Json(response))
}

async fn generate_description(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerateDescriptionRequest>,
) -> Result<Json<DescriptionResponse>, AppError> {
    let controller = VehicleController::new(&state);
    let response = controller.generate_description(request).await?;
    Ok(Json(response))
}

async fn upload_images(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImageUploadResponse>, AppError> {
    let id = parse_vehicle_id(&id)?;
    let files = read_images(multipart?).await?;

    let controller = ImageController::new(&state);
    let response = controller.upload(id, files).await?;
    Ok(Json(response))
}

async fn delete_image(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, String)>,
) -> Result<Json<ImageDeleteResponse>, AppError> {
    let controller = ImageController::new(&state);
    let response = controller.remove(parse_vehicle_id(&id)?, &index).await?;
    Ok(Json(response))
}

/// Leer los archivos del campo `images`; el resto de campos se ignora
async fn read_images(mut multipart: Multipart) -> Result<Vec<IncomingImage>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e.body_text())))?
    {
        if field.name() != Some(IMAGES_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid upload: {}", e.body_text())))?;

        files.push(IncomingImage {
            file_name,
            content_type,
            bytes,
        });
    }

    Ok(files)
}
