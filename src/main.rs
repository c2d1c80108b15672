mod api;
mod config;
mod core;
mod error;
mod infra;
mod models;
#[cfg(test)]
mod test_support;

use axum::{routing::{get, post}, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::dashboard::{dashboard, health, insights, list_logs};
use crate::api::predict::{form_options, predict_outcome};
use crate::api::queries::{list_queries, run_query};
use crate::config::Config;
use crate::core::catalog::QueryCatalog;
use crate::infra::gateway::{mask_credentials, StoreGateway};

pub mod ax_state {
    use super::*;
    pub struct AppState {
        pub gateway: StoreGateway,
        pub catalog: QueryCatalog,
    }

    impl AppState {
        pub fn new(config: &Config) -> Self {
            Self {
                gateway: StoreGateway::new(&config.database_url),
                catalog: QueryCatalog::builtin(),
            }
        }
    }
}

fn app(state: Arc<ax_state::AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/logs", get(list_logs))
        .route("/api/dashboard", get(dashboard))
        .route("/api/insights", get(insights))
        .route("/api/queries", get(list_queries))
        .route("/api/queries/run", post(run_query))
        .route("/api/form/options", get(form_options))
        .route("/api/predict", post(predict_outcome))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "securecheck_backend=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::info!("数据源: {}", mask_credentials(&config.database_url));

    let state = Arc::new(ax_state::AppState::new(&config));
    let app = app(state);

    let addr = SocketAddr::new(config.bind_addr, config.port);
    tracing::info!("🚨 SecureCheck Backend 运行在 http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_stops_db, unique_temp_db_path, SeedStop, TestDb};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app(database_url: String) -> Router {
        let config = Config {
            database_url,
            bind_addr: [127, 0, 0, 1].into(),
            port: 0,
        };
        app(Arc::new(ax_state::AppState::new(&config)))
    }

    async fn response_json(response: Response) -> Value {
        let bytes = match to_bytes(response.into_body(), 1024 * 1024).await {
            Ok(bytes) => bytes,
            Err(err) => panic!("failed to read response body: {err}"),
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(err) => panic!("response body is not JSON: {err}"),
        }
    }

    async fn send(router: Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let request = Request::builder()
            .uri(uri)
            .method(method)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap_or_else(|err| panic!("failed to build request: {err}"));
        match router.oneshot(request).await {
            Ok(response) => response,
            Err(err) => panic!("router request failed: {err}"),
        }
    }

    async fn sample_db() -> TestDb {
        seed_stops_db(&[
            SeedStop::new("male", 26, "Speeding", "Warning"),
            SeedStop::new("male", 28, "Speeding", "Warning"),
            SeedStop::new("male", 29, "Seatbelt", "Citation"),
            SeedStop::new("female", 45, "DUI", "Arrest").searched().drug_related(),
            SeedStop::new("female", 33, "Speeding", "ARRESTED").duration("16-30 Min"),
        ])
        .await
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let db = sample_db().await;
        let response = send(test_app(db.url.clone()), "GET", "/api/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response_json(response).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn logs_return_the_raw_table() {
        let db = sample_db().await;
        let response = send(test_app(db.url.clone()), "GET", "/api/logs", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let value = response_json(response).await;
        assert_eq!(value["notice"], Value::Null);
        assert_eq!(value["table"]["rows"].as_array().map(Vec::len), Some(5));
        assert_eq!(value["table"]["columns"][0], json!("stop_date"));
    }

    #[tokio::test]
    async fn dashboard_computes_metrics_and_charts() {
        let db = sample_db().await;
        let response = send(test_app(db.url.clone()), "GET", "/api/dashboard", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let value = response_json(response).await;
        assert_eq!(
            value["metrics"],
            json!({ "total_stops": 5, "total_arrests": 2, "total_warnings": 2, "drug_related_stops": 1 })
        );
        assert_eq!(value["violations"][0], json!({ "category": "Speeding", "count": 3 }));
        assert_eq!(value["genders"][0], json!({ "category": "male", "count": 3 }));
    }

    #[tokio::test]
    async fn unreachable_store_yields_empty_dashboard_with_notice() {
        let missing = unique_temp_db_path().join("missing.sqlite3");
        let router = test_app(format!("sqlite://{}", missing.display()));

        let response = send(router, "GET", "/api/dashboard", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let value = response_json(response).await;
        assert_eq!(value["metrics"]["total_stops"], json!(0));
        assert!(value["notice"]
            .as_str()
            .is_some_and(|n| n.starts_with("Database Connection Error")));
    }

    #[tokio::test]
    async fn query_list_is_in_catalog_order() {
        let db = sample_db().await;
        let response = send(test_app(db.url.clone()), "GET", "/api/queries", None).await;
        let value = response_json(response).await;
        let items = value.as_array().cloned().unwrap_or_default();
        assert_eq!(items.len(), 19);
        assert_eq!(items[0]["index"], json!(0));
        assert!(items[18]["label"].as_str().is_some_and(|l| l.starts_with("19. ")));
    }

    #[tokio::test]
    async fn running_unknown_label_is_not_found() {
        let db = sample_db().await;
        let response = send(
            test_app(db.url.clone()),
            "POST",
            "/api/queries/run",
            Some(json!({ "label": "99. Nothing" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let value = response_json(response).await;
        assert_eq!(value["status"], json!(404));
    }

    #[tokio::test]
    async fn running_by_index_out_of_range_is_not_found() {
        let db = sample_db().await;
        let response = send(
            test_app(db.url.clone()),
            "POST",
            "/api/queries/run",
            Some(json!({ "index": 19 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn running_without_selection_is_rejected() {
        let db = sample_db().await;
        let response = send(test_app(db.url.clone()), "POST", "/api/queries/run", Some(json!({}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn running_a_catalog_query_returns_its_rows() {
        let db = sample_db().await;
        // 第 9 条查询只用到标准 SQL，SQLite 也能执行
        let response = send(
            test_app(db.url.clone()),
            "POST",
            "/api/queries/run",
            Some(json!({ "index": 8 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let value = response_json(response).await;
        assert!(value["label"].as_str().is_some_and(|l| l.starts_with("9. ")));
        assert_eq!(value["notice"], Value::Null);
        // 所有样本司机都不小于 25 岁
        assert_eq!(value["table"]["rows"], json!([]));
    }

    #[tokio::test]
    async fn store_errors_surface_as_notice_not_failure() {
        let db = sample_db().await;
        // 第 6 条使用 MySQL 的 HOUR()，SQLite 执行失败
        let response = send(
            test_app(db.url.clone()),
            "POST",
            "/api/queries/run",
            Some(json!({ "index": 5 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let value = response_json(response).await;
        assert_eq!(value["table"]["rows"], json!([]));
        assert!(value["notice"].as_str().is_some_and(|n| n.starts_with("Error Fetching Data")));
    }

    #[tokio::test]
    async fn insights_are_computed_from_the_snapshot() {
        let db = sample_db().await;
        let response = send(test_app(db.url.clone()), "GET", "/api/insights", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let value = response_json(response).await;
        let insights = &value["insights"];
        assert_eq!(insights["arrests_by_age_group"], json!([{ "age_group": "36-50", "arrest_count": 1 }]));
        assert_eq!(insights["yearly_by_country"][0]["cumulative_stops"], json!(5));
        assert_eq!(insights["violations_by_arrest_rank"][0]["violation"], json!("DUI"));
        assert_eq!(insights["violations_by_arrest_rank"][0]["arrest_rank"], json!(1));
    }

    #[tokio::test]
    async fn form_options_list_durations_from_data() {
        let db = sample_db().await;
        let response = send(test_app(db.url.clone()), "GET", "/api/form/options", None).await;
        let value = response_json(response).await;
        assert_eq!(value["stop_durations"], json!(["0-15 Min", "16-30 Min"]));
        assert_eq!(value["genders"], json!(["male", "female"]));
        assert_eq!((value["min_age"].clone(), value["max_age"].clone()), (json!(16), json!(100)));
    }

    fn new_log(gender: &str, age: i64, duration: &str) -> Value {
        json!({
            "stop_date": "2024-03-09",
            "stop_time": "21:05:00",
            "country_name": "Canada",
            "driver_gender": gender,
            "driver_age": age,
            "driver_race": "Asian",
            "search_conducted": "0",
            "drugs_related_stop": 0,
            "stop_duration": duration,
            "vehicle_number": "AB1234"
        })
    }

    #[tokio::test]
    async fn predict_uses_similar_stops() {
        let db = sample_db().await;
        let response = send(
            test_app(db.url.clone()),
            "POST",
            "/api/predict",
            Some(new_log("male", 27, "0-15 Min")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let value = response_json(response).await;
        assert_eq!(value["prediction"]["predicted_outcome"], json!("Warning"));
        assert_eq!(value["prediction"]["predicted_violation"], json!("Speeding"));
        assert_eq!(value["prediction"]["matched_stops"], json!(3));
        assert!(value["summary"]
            .as_str()
            .is_some_and(|s| s.contains("stopped at 09:05 PM on 2024-03-09")));
    }

    #[tokio::test]
    async fn predict_falls_back_without_matches() {
        let db = sample_db().await;
        let response = send(
            test_app(db.url.clone()),
            "POST",
            "/api/predict",
            Some(new_log("female", 99, "UNKNOWN")),
        )
        .await;
        let value = response_json(response).await;
        assert_eq!(value["prediction"]["predicted_outcome"], json!("warning"));
        assert_eq!(value["prediction"]["predicted_violation"], json!("speeding"));
    }

    #[tokio::test]
    async fn predict_rejects_out_of_range_age() {
        let db = sample_db().await;
        let response = send(
            test_app(db.url.clone()),
            "POST",
            "/api/predict",
            Some(new_log("male", 12, "0-15 Min")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value = response_json(response).await;
        assert_eq!(value["error"], json!("driver_age must be between 16 and 100"));
    }
}
