use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use transport_authorizations::{AppState, create_router, repository::seed};

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

/// Serves the router over the seeded in-memory store on a random local port.
async fn spawn_app() -> TestApp {
    let router = create_router(AppState::in_memory());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = reqwest::get(format!("{}/health", app.address))
        .await
        .expect("req fail");
    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app().await;
    let doc: Value = reqwest::get(format!("{}/api-docs/openapi.json", app.address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(doc["paths"]["/authorizations"].is_object());
    assert!(doc["paths"]["/authorizations/{id}/certificate"].is_object());
}

#[tokio::test]
async fn test_user_listing_query_string() {
    let app = spawn_app().await;
    let page: Value = reqwest::get(format!(
        "{}/users?sort_by=full_name&sort_direction=descending&limit=2",
        app.address
    ))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();

    assert_eq!(page["total"], 5);
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert_eq!(page["data"][0]["full_name"], "PATRICIA ELENA GOMEZ");
    assert!(page["data"][0]["authorization_groups"].is_array());
}

#[tokio::test]
async fn test_authorization_table_filters_by_validity() {
    let app = spawn_app().await;
    let page: Value = reqwest::get(format!(
        "{}/authorizations?validity=NO%20VIGENTE&sort_by=validity",
        app.address
    ))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(page["total"], 6);
    assert_eq!(page["data"][0]["validity_status"], "NO VIGENTE");
    assert!(page["data"][0]["identification"].is_string());
}

#[tokio::test]
async fn test_export_route_is_not_shadowed_by_id() {
    let app = spawn_app().await;
    let response = reqwest::get(format!(
        "{}/authorizations/export?format=csv&identification=71234567",
        app.address
    ))
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"autorizaciones_"));
    assert!(disposition.ends_with(".csv\""));

    let body = response.text().await.unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("AUTH-2024-002,JUAN CARLOS MARTINEZ,71234567,"));
}

#[tokio::test]
async fn test_annul_lifecycle_over_http() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let refused = client
        .delete(format!("{}/authorizations/{}", app.address, seed::MARIA_PRIMARY))
        .send()
        .await
        .unwrap();
    assert_eq!(refused.status(), StatusCode::CONFLICT);
    let body: Value = refused.json().await.unwrap();
    assert_eq!(body["consumed"], 3);

    let annulled = client
        .delete(format!("{}/authorizations/{}", app.address, seed::ANA_AUTH))
        .send()
        .await
        .unwrap();
    assert_eq!(annulled.status(), StatusCode::NO_CONTENT);

    let gone = client
        .get(format!("{}/authorizations/{}", app.address, seed::ANA_AUTH))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let ana: Value = client
        .get(format!("{}/users/{}", app.address, seed::ANA))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ana["authorization_count"], 0);
    assert_eq!(ana["authorization_groups"][0]["state"], "INACTIVO");
}

#[tokio::test]
async fn test_create_batch_over_http() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let identified: Value = client
        .get(format!("{}/users/by-identification/98456123", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(identified["full_name"], "CARLOS ANDRES LOPEZ");

    let generated: Value = client
        .post(format!("{}/codes/generate", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let code = generated["unique_code"].as_str().unwrap().to_string();

    let payload = json!({
        "user_id": identified["id"],
        "group": { "mode": "new", "unique_code": code },
        "authorizations": [{
            "mipres": "20261019000000000001",
            "voucher": "40000001",
            "start_date": "2026-10-01",
            "end_date": "2027-03-31",
            "authorized_services": 8,
            "is_km": true,
            "km_range": "0-100 km",
            "origin_city": "BUCARAMANGA",
            "destination_city": "CARTAGENA",
            "provider": "RENETUR",
            "tariff_name": "TARIFA ESPECIAL"
        }]
    });

    let created = client
        .post(format!("{}/authorizations", app.address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let created: Value = created.json().await.unwrap();
    assert_eq!(created["unique_code"], code.as_str());
    assert_eq!(created["authorizations"][0]["remaining_services"], 8);

    let invalid = client
        .post(format!("{}/authorizations", app.address))
        .json(&json!({
            "user_id": identified["id"],
            "group": { "mode": "existing", "unique_code": "" },
            "authorizations": []
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors: Value = invalid.json().await.unwrap();
    assert!(errors["errors"]["group"].is_string());
    assert!(errors["errors"]["authorizations"].is_string());
}

#[tokio::test]
async fn test_catalog_and_notices_over_http() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let providers: Value = reqwest::get(format!("{}/catalog/providers", app.address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(providers.as_array().unwrap().len(), 2);

    let tariffs: Value = reqwest::get(format!("{}/catalog/tariffs?search=basica", app.address))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tariffs, json!(["TARIFA BASICA"]));

    let dismissed = client
        .post(format!("{}/notices/latest/dismiss", app.address))
        .header("x-client-id", "browser-42")
        .send()
        .await
        .unwrap();
    assert_eq!(dismissed.status(), StatusCode::NO_CONTENT);

    let notice: Value = client
        .get(format!("{}/notices/latest", app.address))
        .header("x-client-id", "browser-42")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(notice["should_show"], false);
}
