use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use vehicle_marketplace::build_router;
use vehicle_marketplace::config::EnvironmentConfig;
use vehicle_marketplace::models::user::ADMIN_ROLE;
use vehicle_marketplace::models::vehicle::{VehicleRow, VehicleType};
use vehicle_marketplace::repositories::{MemoryUserRepository, MemoryVehicleRepository};
use vehicle_marketplace::services::description_service::{
    DescriptionGenerator, GenerationError, VehicleAttributes,
};
use vehicle_marketplace::state::AppState;

const BOUNDARY: &str = "vehicle-marketplace-test-boundary";

/// Generador determinista; la marca "Lemon" simula un fallo del proveedor
struct StubGenerator;

#[async_trait]
impl DescriptionGenerator for StubGenerator {
    async fn generate(&self, attributes: &VehicleAttributes) -> Result<String, GenerationError> {
        if attributes.brand == "Lemon" {
            return Err(GenerationError::InvalidResponse("HTTP 500".to_string()));
        }
        Ok(format!(
            "A dependable {} {} in {}.",
            attributes.brand, attributes.model_name, attributes.color
        ))
    }
}

struct TestApp {
    router: Router,
    vehicles: Arc<MemoryVehicleRepository>,
    token: String,
    uploads: TempDir,
}

struct TestResponse {
    status: StatusCode,
    bytes: Vec<u8>,
}

impl TestResponse {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).unwrap_or(Value::Null)
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            bytes: bytes.to_vec(),
        }
    }

    async fn get(&self, path: &str) -> TestResponse {
        let request = Request::get(path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn json_request(&self, method: Method, path: &str, body: Value, auth: bool) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if auth {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.json_request(Method::POST, path, body, true).await
    }

    async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.json_request(Method::PUT, path, body, true).await
    }

    async fn delete(&self, path: &str) -> TestResponse {
        let request = Request::delete(path)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn upload(&self, path: &str, files: &[(&str, &str, &str)]) -> TestResponse {
        let mut body = Vec::new();
        for (file_name, content_type, content) in files {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    BOUNDARY, file_name, content_type
                )
                .as_bytes(),
            );
            body.extend_from_slice(content.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let request = Request::post(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn create_vehicle(&self, body: Value) -> Value {
        let response = self.post("/api/vehicles", body).await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        response.json()["vehicle"].clone()
    }
}

async fn create_test_app() -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let config = EnvironmentConfig {
        bcrypt_cost: 4,
        upload_dir: uploads.path().to_path_buf(),
        ..EnvironmentConfig::default()
    };

    let vehicles = Arc::new(MemoryVehicleRepository::new());
    let state = AppState::new(
        config,
        vehicles.clone(),
        Arc::new(MemoryUserRepository::new()),
        Arc::new(StubGenerator),
    );
    let hash = state.auth.hash_password("admin123".to_string()).await.unwrap();
    state.users.create("admin", &hash, ADMIN_ROLE).await.unwrap();

    let mut app = TestApp {
        router: build_router(state),
        vehicles,
        token: String::new(),
        uploads,
    };

    let login = app
        .json_request(
            Method::POST,
            "/api/auth/login",
            json!({ "username": "admin", "password": "admin123" }),
            false,
        )
        .await;
    assert_eq!(login.status_code(), StatusCode::OK);
    app.token = login.json()["token"].as_str().unwrap().to_string();
    app
}

fn vehicle_body(vehicle_type: &str, brand: &str, model: &str, year: i32, price: i64) -> Value {
    json!({
        "vehicleType": vehicle_type,
        "brand": brand,
        "modelName": model,
        "color": "Silver",
        "engineSize": "2.0L",
        "year": year,
        "price": price,
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;
    let response = app.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json()["status"], "ok");
}

#[tokio::test]
async fn test_login_and_me() {
    let app = create_test_app().await;

    let me = app
        .send(
            Request::get("/api/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", app.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(me.status_code(), StatusCode::OK);
    assert_eq!(me.json()["username"], "admin");
    assert_eq!(me.json()["role"], ADMIN_ROLE);

    let wrong = app
        .json_request(
            Method::POST,
            "/api/auth/login",
            json!({ "username": "admin", "password": "nope" }),
            false,
        )
        .await;
    assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.json()["message"], "Invalid credentials");

    let missing = app
        .json_request(Method::POST, "/api/auth/login", json!({ "username": "admin" }), false)
        .await;
    assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(missing.json()["message"], "Username and password are required");
}

#[tokio::test]
async fn test_writes_require_a_valid_token() {
    let app = create_test_app().await;
    let body = vehicle_body("Car", "Toyota", "Camry", 2020, 25000);

    let anonymous = app
        .json_request(Method::POST, "/api/vehicles", body.clone(), false)
        .await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.json()["message"], "Access token required");

    let forged = app
        .send(
            Request::post("/api/vehicles")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, "Bearer not.a.token")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await;
    assert_eq!(forged.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(forged.json()["message"], "Invalid or expired token");

    let list = app.get("/api/vehicles").await;
    assert_eq!(list.status_code(), StatusCode::OK);
    assert_eq!(list.json()["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_create_generates_description_when_omitted() {
    let app = create_test_app().await;

    let response = app
        .post("/api/vehicles", vehicle_body("Car", "Toyota", "Camry", 2020, 25000))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let body = response.json();
    assert_eq!(body["message"], "Vehicle created successfully");
    let description = body["vehicle"]["description"].as_str().unwrap();
    assert!(description.contains("Toyota") && description.contains("Camry"));
    assert_eq!(body["vehicle"]["images"], json!([]));
    assert_eq!(body["vehicle"]["price"], json!(25000.0));
}

#[tokio::test]
async fn test_create_falls_back_when_generator_fails() {
    let app = create_test_app().await;
    let vehicle = app
        .create_vehicle(vehicle_body("SUV", "Lemon", "Squeeze", 2019, 9000))
        .await;
    assert_eq!(vehicle["description"], "2019 Lemon Squeeze - A great suv option!");
}

#[tokio::test]
async fn test_create_rejects_missing_fields() {
    let app = create_test_app().await;

    let response = app
        .post("/api/vehicles", json!({ "brand": "Toyota", "modelName": "Camry" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["message"], "All required fields must be provided");

    let bad_type = app
        .post("/api/vehicles", vehicle_body("Truck", "Volvo", "FH", 2020, 90000))
        .await;
    assert_eq!(bad_type.status_code(), StatusCode::BAD_REQUEST);

    let malformed = app
        .send(
            Request::post("/api/vehicles")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {}", app.token))
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_brand_filter_returns_only_matches() {
    let app = create_test_app().await;
    app.create_vehicle(vehicle_body("Car", "Toyota", "Camry", 2020, 25000)).await;
    app.create_vehicle(vehicle_body("Car", "Honda", "Civic", 2021, 22000)).await;

    for query in ["brand=Toyota", "brand=toy"] {
        let response = app.get(&format!("/api/vehicles?{}", query)).await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let body = response.json();
        let vehicles = body["vehicles"].as_array().unwrap();
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0]["modelName"], "Camry");
        assert_eq!(body["pagination"]["total"], 1);
    }
}

#[tokio::test]
async fn test_filters_combine_with_and() {
    let app = create_test_app().await;
    app.create_vehicle(vehicle_body("Car", "Toyota", "Camry", 2020, 25000)).await;
    app.create_vehicle(vehicle_body("SUV", "Toyota", "RAV4", 2022, 32000)).await;
    app.create_vehicle(vehicle_body("Bike", "Yamaha", "MT-07", 2021, 7500)).await;

    let body = app
        .get("/api/vehicles?brand=toyota&minPrice=26000&maxYear=2023")
        .await
        .json();
    let vehicles = body["vehicles"].as_array().unwrap();
    assert_eq!(vehicles.len(), 1);
    assert_eq!(vehicles[0]["modelName"], "RAV4");

    let bikes = app.get("/api/vehicles?vehicleType=Bike").await.json();
    assert_eq!(bikes["pagination"]["total"], 1);
    assert_eq!(bikes["vehicles"][0]["brand"], "Yamaha");

    let none = app.get("/api/vehicles?minYear=2030").await.json();
    assert_eq!(none["vehicles"], json!([]));
    assert_eq!(none["pagination"]["totalPages"], 0);
}

#[tokio::test]
async fn test_pagination_and_sorting() {
    let app = create_test_app().await;
    for (model, price) in [("A", 3000), ("B", 1000), ("C", 2000)] {
        app.create_vehicle(vehicle_body("Car", "Fiat", model, 2018, price)).await;
    }

    let first = app
        .get("/api/vehicles?limit=2&page=1&sortBy=price&sortOrder=ASC")
        .await
        .json();
    assert_eq!(
        first["pagination"],
        json!({ "total": 3, "page": 1, "limit": 2, "totalPages": 2 })
    );
    let models: Vec<_> = first["vehicles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["modelName"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(models, vec!["B", "C"]);

    let second = app
        .get("/api/vehicles?limit=2&page=2&sortBy=price&sortOrder=asc")
        .await
        .json();
    assert_eq!(second["vehicles"].as_array().unwrap().len(), 1);
    assert_eq!(second["vehicles"][0]["modelName"], "A");

    let clamped = app.get("/api/vehicles?limit=0").await.json();
    assert_eq!(clamped["pagination"]["limit"], 1);
    assert_eq!(clamped["pagination"]["totalPages"], 3);
}

#[tokio::test]
async fn test_invalid_query_parameters_are_rejected() {
    let app = create_test_app().await;

    for query in ["sortBy=password", "sortOrder=UP", "page=two", "minPrice=cheap"] {
        let response = app.get(&format!("/api/vehicles?{}", query)).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "{}", query);
    }
}

#[tokio::test]
async fn test_malformed_query_string_returns_json_error() {
    let app = create_test_app().await;
    let response = app.get("/api/vehicles?brand=a&brand=b").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body = response.json();
    assert!(body["message"].as_str().unwrap().contains("brand"));
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_get_by_id() {
    let app = create_test_app().await;
    let created = app
        .create_vehicle(vehicle_body("Car", "Toyota", "Camry", 2020, 25000))
        .await;

    let response = app
        .get(&format!("/api/vehicles/{}", created["id"].as_str().unwrap()))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json()["id"], created["id"]);

    let missing = app.get(&format!("/api/vehicles/{}", Uuid::new_v4())).await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(missing.json()["message"], "Vehicle not found");

    let garbage = app.get("/api/vehicles/not-a-uuid").await;
    assert_eq!(garbage.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_merges_fields() {
    let app = create_test_app().await;
    let mut body = vehicle_body("Car", "Toyota", "Camry", 2020, 25000);
    body["images"] = json!(["front.jpg", "back.jpg"]);
    body["description"] = json!("Original text");
    let created = app.create_vehicle(body).await;
    let path = format!("/api/vehicles/{}", created["id"].as_str().unwrap());

    let response = app
        .put(
            &path,
            json!({ "color": "Red", "brand": "", "regenerateDescription": false }),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated = response.json();
    assert_eq!(updated["message"], "Vehicle updated successfully");
    assert_eq!(updated["vehicle"]["color"], "Red");
    assert_eq!(updated["vehicle"]["brand"], "Toyota");
    assert_eq!(updated["vehicle"]["images"], json!(["front.jpg", "back.jpg"]));
    assert_eq!(updated["vehicle"]["description"], "Original text");

    let replaced = app.put(&path, json!({ "images": ["only.jpg"] })).await.json();
    assert_eq!(replaced["vehicle"]["images"], json!(["only.jpg"]));
    assert_eq!(
        replaced["vehicle"]["description"],
        "A dependable Toyota Camry in Red."
    );

    let missing = app
        .put(&format!("/api/vehicles/{}", Uuid::new_v4()), json!({ "color": "Blue" }))
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_keeps_description_when_regeneration_fails() {
    let app = create_test_app().await;
    let mut body = vehicle_body("Car", "Lemon", "Squeeze", 2019, 9000);
    body["description"] = json!("Keep me");
    let created = app.create_vehicle(body).await;

    let response = app
        .put(
            &format!("/api/vehicles/{}", created["id"].as_str().unwrap()),
            json!({ "regenerateDescription": true }),
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json();
    assert_eq!(body["vehicle"]["description"], "Keep me");
    assert!(body["warning"].is_string());
}

#[tokio::test]
async fn test_delete_vehicle() {
    let app = create_test_app().await;
    let created = app
        .create_vehicle(vehicle_body("Car", "Toyota", "Camry", 2020, 25000))
        .await;
    let id = created["id"].as_str().unwrap().to_string();

    let uploaded = app
        .upload(
            &format!("/api/vehicles/{}/images", id),
            &[("front.jpg", "image/jpeg", "jpeg-bytes")],
        )
        .await;
    assert_eq!(uploaded.status_code(), StatusCode::OK);

    let response = app.delete(&format!("/api/vehicles/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json()["message"], "Vehicle deleted successfully");

    assert_eq!(
        app.get(&format!("/api/vehicles/{}", id)).await.status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.delete(&format!("/api/vehicles/{}", id)).await.status_code(),
        StatusCode::NOT_FOUND
    );
    assert!(!app.uploads.path().join("vehicles").join(&id).exists());
}

#[tokio::test]
async fn test_upload_images_appends_and_serves_files() {
    let app = create_test_app().await;
    let mut body = vehicle_body("Car", "Toyota", "Camry", 2020, 25000);
    body["images"] = json!(["https://cdn.example.com/existing.jpg"]);
    let created = app.create_vehicle(body).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .upload(
            &format!("/api/vehicles/{}/images", id),
            &[
                ("front.jpg", "image/jpeg", "front"),
                ("side.png", "image/png", "side"),
            ],
        )
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json();
    assert_eq!(body["message"], "Images uploaded successfully");
    assert_eq!(body["totalImages"], 3);
    let new_images = body["images"].as_array().unwrap().clone();
    assert_eq!(new_images.len(), 2);

    let stored = app.get(&format!("/api/vehicles/{}", id)).await.json();
    let images = stored["images"].as_array().unwrap();
    assert_eq!(images[0], "https://cdn.example.com/existing.jpg");
    assert_eq!(&images[1..], new_images.as_slice());

    let url = new_images[0].as_str().unwrap();
    let served_path = &url[url.find("/uploads/").unwrap()..];
    let served = app.get(served_path).await;
    assert_eq!(served.status_code(), StatusCode::OK);
    assert_eq!(served.bytes, b"front");

    let alias = app
        .upload(
            &format!("/api/vehicles/{}/upload-images", id),
            &[("rear.webp", "image/webp", "rear")],
        )
        .await;
    assert_eq!(alias.json()["totalImages"], 4);
}

#[tokio::test]
async fn test_upload_rejections() {
    let app = create_test_app().await;
    let created = app
        .create_vehicle(vehicle_body("Car", "Toyota", "Camry", 2020, 25000))
        .await;
    let path = format!("/api/vehicles/{}/images", created["id"].as_str().unwrap());

    let empty = app.upload(&path, &[]).await;
    assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(empty.json()["message"], "No images provided");

    let text = app.upload(&path, &[("notes.txt", "text/plain", "hello")]).await;
    assert_eq!(text.status_code(), StatusCode::BAD_REQUEST);

    let unknown = app
        .upload(
            &format!("/api/vehicles/{}/images", Uuid::new_v4()),
            &[("front.jpg", "image/jpeg", "front")],
        )
        .await;
    assert_eq!(unknown.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remove_image_by_index() {
    let app = create_test_app().await;
    let mut body = vehicle_body("Car", "Toyota", "Camry", 2020, 25000);
    body["images"] = json!(["a.jpg", "b.jpg", "c.jpg"]);
    let created = app.create_vehicle(body).await;
    let id = created["id"].as_str().unwrap();

    let response = app.delete(&format!("/api/vehicles/{}/images/1", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json();
    assert_eq!(body["message"], "Image deleted successfully");
    assert_eq!(body["images"], json!(["a.jpg", "c.jpg"]));
    assert_eq!(body["totalImages"], 2);

    for index in ["5", "-1", "first"] {
        let invalid = app
            .delete(&format!("/api/vehicles/{}/images/{}", id, index))
            .await;
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST, "{}", index);
        assert_eq!(invalid.json()["message"], "Invalid image index");
    }

    let stored = app.get(&format!("/api/vehicles/{}", id)).await.json();
    assert_eq!(stored["images"], json!(["a.jpg", "c.jpg"]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_image_removals_are_serialized() {
    let app = create_test_app().await;
    let mut body = vehicle_body("Car", "Toyota", "Camry", 2020, 25000);
    body["images"] = json!(["a.jpg", "b.jpg", "c.jpg"]);
    let created = app.create_vehicle(body).await;
    let path = format!("/api/vehicles/{}/images/0", created["id"].as_str().unwrap());

    let (first, second) = tokio::join!(app.delete(&path), app.delete(&path));
    assert_eq!(first.status_code(), StatusCode::OK);
    assert_eq!(second.status_code(), StatusCode::OK);

    let stored = app
        .get(&format!("/api/vehicles/{}", created["id"].as_str().unwrap()))
        .await
        .json();
    assert_eq!(stored["images"], json!(["c.jpg"]));
}

#[tokio::test]
async fn test_corrupted_image_column_reads_as_list() {
    let app = create_test_app().await;
    let now = Utc::now();
    let id = Uuid::new_v4();
    app.vehicles
        .insert_row(VehicleRow {
            id,
            vehicle_type: VehicleType::Car,
            brand: "Legacy".to_string(),
            model_name: "Import".to_string(),
            color: "Grey".to_string(),
            engine_size: "1.6L".to_string(),
            year: 2012,
            price: Decimal::new(4000, 0),
            images: json!("[\"old.jpg\"]"),
            description: None,
            creator_id: None,
            created_at: now,
            updated_at: now,
        })
        .await;

    let vehicle = app.get(&format!("/api/vehicles/{}", id)).await.json();
    assert_eq!(vehicle["images"], json!(["old.jpg"]));

    let appended = app
        .upload(
            &format!("/api/vehicles/{}/images", id),
            &[("new.jpg", "image/jpeg", "new")],
        )
        .await
        .json();
    assert_eq!(appended["totalImages"], 2);
}

#[tokio::test]
async fn test_generate_description_endpoint() {
    let app = create_test_app().await;

    let ok = app
        .post(
            "/api/vehicles/generate-description",
            vehicle_body("SUV", "Toyota", "RAV4", 2022, 32000),
        )
        .await;
    assert_eq!(ok.status_code(), StatusCode::OK);
    assert_eq!(ok.json()["description"], "A dependable Toyota RAV4 in Silver.");

    let incomplete = app
        .post("/api/vehicles/generate-description", json!({ "brand": "Toyota" }))
        .await;
    assert_eq!(incomplete.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        incomplete.json()["message"],
        "All vehicle details are required for description generation"
    );

    let failing = app
        .post(
            "/api/vehicles/generate-description",
            vehicle_body("Car", "Lemon", "Squeeze", 2019, 9000),
        )
        .await;
    assert_eq!(failing.status_code(), StatusCode::BAD_GATEWAY);
}
