use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use crate::config::Config;
use crate::helpers::handler_404::page_not_found_handler;
use crate::repositories::VisiterRepo;

pub mod health_check;
pub mod visiter_controller;

#[derive(Clone)]
pub struct AppState {
    pub visiter_repo: Arc<dyn VisiterRepo>,
}

impl AppState {
    pub fn new(visiter_repo: Arc<dyn VisiterRepo>) -> Self {
        Self { visiter_repo }
    }
}

pub async fn serve(
    app_state: AppState,
    config: &Config,
) -> anyhow::Result<()> {
    let origins = parse_origins(&config.origin_urls)?;
    let application = application(app_state, origins);

    let address: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    info!("API server listening on: {}", address);
    axum::Server::try_bind(&address)
        .with_context(|| format!("Failed to bind {}", address))?
        .serve(application.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Error spinning up the API server")
}

/// Full HTTP surface with CORS, compression and request tracing applied.
pub fn application(app_state: AppState, origins: Vec<HeaderValue>) -> Router {
    router_endpoints(app_state)
        .fallback(page_not_found_handler)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PUT,
                            Method::DELETE,
                            Method::OPTIONS
                        ])
                        .allow_origin(origins)
                        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                )
                .layer(CompressionLayer::new())
        )
}

pub fn router_endpoints(app_state: AppState) -> Router {
    health_check::router()
        .merge(visiter_controller::router(app_state))
}

/// Comma separated origins, blanks ignored.
pub fn parse_origins(origin_urls: &str) -> anyhow::Result<Vec<HeaderValue>> {
    origin_urls
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<HeaderValue>().with_context(|| format!("Invalid origin url: {}", s)))
        .collect()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down API server");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use crate::repositories::memory_repo::InMemoryVisiterRepo;

    fn test_app() -> Router {
        let repo: Arc<dyn VisiterRepo> = Arc::new(InMemoryVisiterRepo::new());
        application(AppState::new(repo), Vec::new())
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn booking(date: &str, count: u32) -> Value {
        json!({
            "VisitDate": format!("{}T00:00:00.000Z", date),
            "NumberOfVisiter": count,
            "UserID": 1,
            "VisitingID": 2
        })
    }

    #[tokio::test]
    async fn health_check_is_ok() {
        let app = test_app();
        let (status, _) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_endpoint_is_json_404() {
        let app = test_app();
        let (status, body) = send(&app, Method::GET, "/dogs", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn booking_lifecycle() {
        let app = test_app();

        let (status, body) = send(&app, Method::GET, "/visiters", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "data": [] }));

        let (status, body) = send(&app, Method::POST, "/visiters", Some(booking("2025-02-10", 3))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["ID"].as_i64().unwrap();
        assert_eq!(body["data"]["VisitDate"], "2025-02-10T00:00:00Z");
        assert_eq!(body["data"]["NumberOfVisiter"], 3);

        let (status, body) = send(&app, Method::GET, &format!("/visiters/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["UserID"], 1);

        let (status, body) = send(&app, Method::GET, "/visiters", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, _) = send(&app, Method::DELETE, &format!("/visiters/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::DELETE, &format!("/visiters/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, &format!("/visiters/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&app, Method::GET, "/visiters", None).await;
        assert_eq!(body, json!({ "data": [] }));
    }

    #[tokio::test]
    async fn over_capacity_booking_is_a_conflict() {
        let app = test_app();
        for _ in 0..19 {
            let (status, _) = send(&app, Method::POST, "/visiters", Some(booking("2025-02-10", 5))).await;
            assert_eq!(status, StatusCode::CREATED);
        }
        let (status, _) = send(&app, Method::POST, "/visiters", Some(booking("2025-02-10", 2))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&app, Method::POST, "/visiters", Some(booking("2025-02-10", 4))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "booking failed, only 3 places left on 2025-02-10");

        let (status, body) = send(&app, Method::GET, "/availability?date=2025-02-10", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["booked"], 97);
        assert_eq!(body["data"]["remaining"], 3);
        assert_eq!(body["data"]["capacity"], 100);
        assert_eq!(body["data"]["party_sizes"], json!([1, 2, 3]));
    }

    #[tokio::test]
    async fn rejects_empty_party() {
        let app = test_app();
        let (status, _) = send(&app, Method::POST, "/visiters", Some(booking("2025-02-10", 0))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_malformed_ids_and_dates() {
        let app = test_app();
        for uri in ["/visiters/abc", "/availability?date=tomorrow", "/availability"] {
            let (status, body) = send(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(body["message"].is_string(), "{}", uri);
        }

        let (status, body) = send(&app, Method::DELETE, "/visiters/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn malformed_booking_body_is_a_json_bad_request() {
        let app = test_app();
        let body = json!({
            "VisitDate": "tomorrow",
            "NumberOfVisiter": 2,
            "UserID": 1,
            "VisitingID": 2
        });
        let (status, body) = send(&app, Method::POST, "/visiters", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("tomorrow"));

        let (status, body) = send(&app, Method::POST, "/visiters", Some(json!({ "NumberOfVisiter": 2 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());

        let (_, body) = send(&app, Method::GET, "/visiters", None).await;
        assert_eq!(body, json!({ "data": [] }));
    }

    #[test]
    fn parses_origin_list() {
        let origins = parse_origins("http://localhost:5173, https://shelter.example.org,").unwrap();
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[1], "https://shelter.example.org");
        assert!(parse_origins("bad\norigin").is_err());
    }
}
