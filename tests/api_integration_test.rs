// API integration tests that verify HTTP endpoints
// Tests the actual Axum router with real HTTP requests

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt; // For `.collect()`
use serde_json::{json, Value};
use tower::ServiceExt; // For `oneshot`

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn post_form(app: &axum::Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn post_json(app: &axum::Router, uri: &str, payload: &Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(payload).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _pool) = common::test_app().await;

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "conectada");
    assert_eq!(body["message"], "Servidor funcionando correctamente");
}

#[tokio::test]
async fn test_dashboard_statistics() {
    let (app, pool) = common::test_app().await;

    let station = common::insert_station(&pool, "Entrada del Muelle", "activa").await;
    let parameter = common::insert_parameter(&pool, "Temperatura", "°C", 35.0).await;
    common::insert_measurement(&pool, station, parameter, 21.0, &common::now_stamp()).await;

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["estadisticas"]["total_mediciones"], 1);
    assert_eq!(body["estadisticas"]["mediciones_hoy"], 1);
    assert_eq!(body["estadisticas"]["estaciones_activas"], 1);
    assert!(body["estadisticas"]["ultimo_registro"].is_string());
}

#[tokio::test]
async fn test_monitoring_catalog_lists_only_active_stations() {
    let (app, pool) = common::test_app().await;

    common::insert_station(&pool, "Entrada del Muelle", "activa").await;
    common::insert_station(&pool, "Muelle Viejo", "inactiva").await;
    common::insert_parameter(&pool, "pH", "escala", 8.5).await;

    let (status, body) = get(&app, "/monitoreo").await;
    assert_eq!(status, StatusCode::OK);

    let estaciones = body["estaciones"].as_array().unwrap();
    assert_eq!(estaciones.len(), 1);
    assert_eq!(estaciones[0]["nombre_estacion"], "Entrada del Muelle");

    let parametros = body["parametros"].as_array().unwrap();
    assert_eq!(parametros.len(), 1);
    assert_eq!(parametros[0]["valor_limite_permisible"], 8.5);
}

#[tokio::test]
async fn test_add_measurement_and_exceedance_flow() {
    let (app, pool) = common::test_app().await;

    let station = common::insert_station(&pool, "Entrada del Muelle", "activa").await;
    let parameter = common::insert_parameter(&pool, "Temperatura", "°C", 35.0).await;

    let body = format!(
        "estacion={station}&parametro={parameter}&valor=40.0&responsable=Juan+Perez&condiciones=Soleado"
    );
    let (status, response) = post_form(&app, "/agregar_medicion", &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], true);
    assert_eq!(response["message"], "Medición agregada correctamente");
    assert!(response["id"].is_number());

    // The snapshot classifies 40.0 > 35.0 as an alert
    let (status, snapshot) = get(&app, "/api/datos/recientes").await;
    assert_eq!(status, StatusCode::OK);
    let entry = &snapshot["temperatura"];
    assert_eq!(entry["valor"], 40.0);
    assert_eq!(entry["estado"], "alerta");
    assert_eq!(entry["limite"], 35.0);
    assert_eq!(entry["unidad"], "°C");
    assert_eq!(entry["estacion"], "Entrada del Muelle");
}

#[tokio::test]
async fn test_exceedance_requires_strictly_greater_value() {
    let (app, pool) = common::test_app().await;

    let station = common::insert_station(&pool, "Zona de embarque", "activa").await;
    let parameter = common::insert_parameter(&pool, "Salinidad", "ppm", 35.0).await;
    common::insert_measurement(&pool, station, parameter, 35.0, &common::now_stamp()).await;

    let (_, snapshot) = get(&app, "/api/datos/recientes").await;
    assert_eq!(snapshot["salinidad"]["estado"], "normal");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/exportar/csv")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let csv = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(csv.to_vec()).unwrap();
    assert!(text.contains("Normal"));
    assert!(!text.contains("Excede límite"));
}

#[tokio::test]
async fn test_add_measurement_missing_required_field() {
    let (app, _pool) = common::test_app().await;

    let (status, response) = post_form(&app, "/agregar_medicion", "estacion=1&parametro=1&valor=20").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], false);
    assert!(response["message"]
        .as_str()
        .unwrap()
        .contains("responsable"));
}

#[tokio::test]
async fn test_add_measurement_rejects_bad_values() {
    let (app, pool) = common::test_app().await;

    let station = common::insert_station(&pool, "Entrada del Muelle", "activa").await;
    let parameter = common::insert_parameter(&pool, "Temperatura", "°C", 35.0).await;

    let body = format!("estacion={station}&parametro={parameter}&valor=abc&responsable=Ana");
    let (status, response) = post_form(&app, "/agregar_medicion", &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], false);
    assert!(response["message"].as_str().unwrap().contains("número válido"));

    let body = format!("estacion={station}&parametro={parameter}&valor=2000&responsable=Ana");
    let (_, response) = post_form(&app, "/agregar_medicion", &body).await;
    assert_eq!(response["success"], false);
    assert!(response["message"].as_str().unwrap().contains("-100 a 1000"));

    // Nothing was persisted by the rejected submissions
    let (_, stats) = get(&app, "/").await;
    assert_eq!(stats["estadisticas"]["total_mediciones"], 0);
}

#[tokio::test]
async fn test_batch_ingestion_skips_invalid_values() {
    let (app, _pool) = common::test_app().await;

    let payload = json!({
        "temperatura": 22.5,
        "humedad": 60,
        "presion": 1010.2,
        "viento": "3.4",
        "lluvia": 0.0,
        "ph": "malo",
        "observaciones": "lote nocturno",
        "timestamp": "2025-03-01T10:00:00Z"
    });

    let (status, response) = post_json(&app, "/api/monitoreo", &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["success"], true);
    assert_eq!(response["mediciones_procesadas"], 5);

    // With no active station, the batch created its remote default
    let (_, catalog) = get(&app, "/monitoreo").await;
    let estaciones = catalog["estaciones"].as_array().unwrap();
    assert_eq!(estaciones.len(), 1);
    assert_eq!(estaciones[0]["nombre_estacion"], "Estación API");

    // Unknown parameters were created with inferred units and limits
    let parametros = catalog["parametros"].as_array().unwrap();
    assert_eq!(parametros.len(), 5);
    let temperatura = parametros
        .iter()
        .find(|p| p["nombre_parametro"] == "Temperatura")
        .unwrap();
    assert_eq!(temperatura["unidad_medida"], "°C");
    assert_eq!(temperatura["valor_limite_permisible"], 35.0);

    // Saved measurements carry the shared observations and attribution
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/exportar/csv")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let csv = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(csv.to_vec()).unwrap();
    assert!(text.contains("Sistema Automático"));
    assert!(text.contains("lote nocturno"));
}

#[tokio::test]
async fn test_batch_ingestion_reuses_existing_station_and_parameter() {
    let (app, pool) = common::test_app().await;

    common::insert_station(&pool, "Entrada del Muelle", "activa").await;
    common::insert_parameter(&pool, "Temperatura", "°C", 35.0).await;

    let (_, response) = post_json(&app, "/api/monitoreo", &json!({"temperatura": 18.0})).await;
    assert_eq!(response["mediciones_procesadas"], 1);

    let (_, catalog) = get(&app, "/monitoreo").await;
    // Fuzzy match found the seeded parameter instead of creating another
    assert_eq!(catalog["parametros"].as_array().unwrap().len(), 1);
    assert_eq!(catalog["estaciones"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_batch_ingestion_rejects_malformed_payloads() {
    let (app, _pool) = common::test_app().await;

    // Wrong content type
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/monitoreo")
                .header("content-type", "text/plain")
                .body(Body::from("temperatura=20"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Invalid JSON body
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/monitoreo")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Empty object
    let (status, response) = post_json(&app, "/api/monitoreo", &json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["success"], false);
}

#[tokio::test]
async fn test_empty_store_serves_demo_snapshot() {
    let pool = common::test_pool().await;
    let app = common::build_app(pool, true);

    let (status, snapshot) = get(&app, "/api/datos/recientes").await;
    assert_eq!(status, StatusCode::OK);

    let entries = snapshot.as_object().unwrap();
    assert_eq!(entries.len(), 1);
    let entry = &snapshot["temperatura"];
    assert_eq!(entry["valor"], 24.5);
    assert_eq!(entry["unidad"], "°C");
    assert_eq!(entry["estacion"], "Sistema de Ejemplo");
    assert_eq!(entry["limite"], 30.0);
    assert_eq!(entry["estado"], "normal");
}

#[tokio::test]
async fn test_empty_store_serves_demo_chart_series() {
    let pool = common::test_pool().await;
    let app = common::build_app(pool, true);

    let (status, series) = get(&app, "/api/datos_grafico/temperatura").await;
    assert_eq!(status, StatusCode::OK);

    let points = series.as_array().unwrap();
    assert_eq!(points.len(), 7);
    let values: Vec<f64> = points.iter().map(|p| p["valor"].as_f64().unwrap()).collect();
    assert_eq!(values, vec![20.0, 23.0, 22.0, 26.0, 29.0, 28.0, 32.0]);
}

#[tokio::test]
async fn test_empty_store_without_demo_fallback() {
    let (app, _pool) = common::test_app().await;

    let (_, snapshot) = get(&app, "/api/datos/recientes").await;
    assert_eq!(snapshot.as_object().unwrap().len(), 0);

    let (_, series) = get(&app, "/api/datos_grafico/temperatura").await;
    assert_eq!(series.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_chart_series_buckets_by_day() {
    let (app, pool) = common::test_app().await;

    let station = common::insert_station(&pool, "Entrada del Muelle", "activa").await;
    let parameter = common::insert_parameter(&pool, "Temperatura", "°C", 35.0).await;

    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    common::insert_measurement(&pool, station, parameter, 20.0, &format!("{today} 08:00:00")).await;
    common::insert_measurement(&pool, station, parameter, 30.0, &format!("{today} 14:00:00")).await;

    let (status, series) = get(&app, "/api/datos_grafico/Temperatura").await;
    assert_eq!(status, StatusCode::OK);

    let points = series.as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["fecha"], today);
    assert_eq!(points[0]["valor"], 25.0);
    assert_eq!(points[0]["cantidad"], 2);
}

#[tokio::test]
async fn test_reports_page_lists_measurements_and_summary() {
    let (app, pool) = common::test_app().await;

    let station = common::insert_station(&pool, "Zona de embarque", "activa").await;
    let parameter = common::insert_parameter(&pool, "Oxígeno Disuelto (OD)", "mg/L", 5.0).await;
    common::insert_measurement(&pool, station, parameter, 4.0, &common::now_stamp()).await;
    common::insert_measurement(&pool, station, parameter, 6.0, &common::now_stamp()).await;

    let (status, page) = get(&app, "/reportes").await;
    assert_eq!(status, StatusCode::OK);

    let mediciones = page["mediciones"].as_array().unwrap();
    assert_eq!(mediciones.len(), 2);
    assert!(mediciones
        .iter()
        .any(|m| m["estado"] == "Excede límite" && m["valor"] == 6.0));

    let resumen = page["resumen_parametros"].as_array().unwrap();
    assert_eq!(resumen.len(), 1);
    assert_eq!(resumen[0]["parametro"], "Oxígeno Disuelto (OD)");
    assert_eq!(resumen[0]["total_mediciones"], 2);
    assert_eq!(resumen[0]["promedio"], 5.0);
    assert_eq!(resumen[0]["minimo"], 4.0);
    assert_eq!(resumen[0]["maximo"], 6.0);
}

#[tokio::test]
async fn test_export_endpoints_reject_empty_store() {
    let (app, _pool) = common::test_app().await;

    for uri in ["/exportar/csv", "/exportar/excel", "/exportar/pdf"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri} should 404");
        assert_eq!(body["error"], "No hay datos para exportar");
    }
}

#[tokio::test]
async fn test_export_downloads_have_attachment_headers() {
    let (app, pool) = common::test_app().await;

    let station = common::insert_station(&pool, "Entrada del Muelle", "activa").await;
    let parameter = common::insert_parameter(&pool, "Temperatura", "°C", 35.0).await;
    common::insert_measurement(&pool, station, parameter, 21.5, &common::now_stamp()).await;

    let cases = [
        ("/exportar/csv", "text/csv", b"Fech".as_slice()),
        (
            "/exportar/excel",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            b"PK".as_slice(),
        ),
        ("/exportar/pdf", "application/pdf", b"%PDF".as_slice()),
    ];

    for (uri, content_type, magic) in cases {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let headers = response.headers().clone();
        assert!(headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with(content_type));
        let disposition = headers
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=monitoreo_ambiental_"));

        let body = response.into_body().collect().await.unwrap().to_bytes();
        // UTF-8 BOM-free CSV starts with the header; binary formats with magic bytes
        assert_eq!(&body[..magic.len()], magic, "{uri}");
    }
}

#[tokio::test]
async fn test_csv_export_contains_full_projection() {
    let (app, pool) = common::test_app().await;

    let station = common::insert_station(&pool, "Entrada del Muelle", "activa").await;
    let parameter = common::insert_parameter(&pool, "Temperatura", "°C", 35.0).await;
    common::insert_measurement(&pool, station, parameter, 40.0, &common::now_stamp()).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/exportar/csv")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();
    let mut lines = text.lines();

    assert_eq!(
        lines.next().unwrap(),
        "Fecha,Estación,Parámetro,Valor,Unidad,Límite,Responsable,Condiciones,Observaciones,Estado"
    );
    let row = lines.next().unwrap();
    assert!(row.contains("Entrada del Muelle"));
    assert!(row.contains("Temperatura"));
    assert!(row.contains("40"));
    assert!(row.ends_with("Excede límite"));
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let (app, _pool) = common::test_app().await;

    let (status, body) = get(&app, "/no/existe").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Página no encontrada");
    assert_eq!(body["codigo"], 404);
}

#[tokio::test]
async fn test_openapi_spec_endpoint() {
    let (app, _pool) = common::test_app().await;

    let (status, json) = get(&app, "/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["openapi"].is_string());
    assert_eq!(json["info"]["title"], "Port Monitor Service API");
    assert!(json["paths"].is_object());
}

#[tokio::test]
async fn test_redoc_ui_endpoint() {
    let (app, _pool) = common::test_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/docs").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("<title>Port Monitor API Documentation</title>"));
    assert!(html.contains("redoc"));
}
