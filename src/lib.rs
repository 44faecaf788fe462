//! Portfolio API - library for app logic and testing

pub mod db;
pub mod error;
pub mod logging;
pub mod routes;
pub mod seed;
pub mod services;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, patch},
    Router,
};
use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use db::{init_database, DbConfig, PgDocumentStore, SharedStore};
use services::{ContactService, DeploymentProfile, IdGenerator, PortfolioService, UuidGenerator};

/// Request bodies above this size are refused before reaching a handler.
pub const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Shared by every handler. Cloning is cheap: all members are `Arc`-backed.
#[derive(Clone)]
pub struct AppState {
    pub contact: ContactService,
    pub portfolio: PortfolioService,
    pub store: SharedStore,
}

impl AppState {
    pub fn new(
        store: SharedStore,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        profile: DeploymentProfile,
    ) -> Self {
        Self {
            contact: ContactService::new(store.clone(), clock, ids),
            portfolio: PortfolioService::new(store.clone(), profile),
            store,
        }
    }
}

/// CORS from `ALLOWED_ORIGINS` (comma-separated). When unset every origin is
/// accepted by mirroring it back, which keeps credentials usable.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().and_then(|s| {
        let origins: Vec<HeaderValue> = s
            .split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect();
        if origins.is_empty() {
            None
        } else {
            Some(origins)
        }
    });
    cors_layer(allowed_origins)
}

fn cors_layer(allowed_origins: Option<Vec<HeaderValue>>) -> CorsLayer {
    let origin = match allowed_origins {
        Some(origins) => AllowOrigin::list(origins),
        None => AllowOrigin::mirror_request(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors();
    tracing::info!("CORS configured");
    router(state, cors)
}

fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api", get(routes::health::root))
        .route("/api/", get(routes::health::root))
        .route("/api/health", get(routes::health::health))
        .route("/api/health/database", get(routes::health::health_database))
        .route(
            "/api/contact",
            get(routes::contact::list_messages).post(routes::contact::create_message),
        )
        .route(
            "/api/contact/",
            get(routes::contact::list_messages).post(routes::contact::create_message),
        )
        .route("/api/contact/{id}", get(routes::contact::get_message))
        .route("/api/contact/{id}/status", patch(routes::contact::update_status))
        .route("/api/portfolio/projects", get(routes::portfolio::list_projects))
        .route("/api/portfolio/projects/{id}", get(routes::portfolio::get_project))
        .route("/api/portfolio/experience", get(routes::portfolio::list_experience))
        .route("/api/portfolio/expertise", get(routes::portfolio::list_expertise))
        .route("/api/portfolio/stats", get(routes::portfolio::stats))
        .fallback(routes::not_found)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Run the server (used by main).
pub async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    // Dropping these stops the background log writers.
    let _log_guards = logging::init(&logging::LogConfig::from_env())?;

    let db_config = DbConfig::default();
    let store: SharedStore = Arc::new(PgDocumentStore::connect_lazy(&db_config)?);
    init_database(store.as_ref()).await;

    let state = AppState::new(
        store.clone(),
        Arc::new(DefaultClock),
        Arc::new(UuidGenerator),
        DeploymentProfile::default(),
    );
    let app = create_app(state);

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = match std::env::var("PORT") {
        Ok(raw) => raw.parse::<u16>().map_err(|e| format!("Invalid PORT `{raw}`: {e}"))?,
        Err(_) => 8001,
    };

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    tracing::info!("Starting server on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{failing_state, memory_state};
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(state: AppState) -> Router {
        router(state, cors_layer(None))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn jane() -> Value {
        json!({
            "name": "Jane Doe",
            "email": "jane@example.com",
            "subject": "Hello there",
            "message": "This is a sufficiently long test message."
        })
    }

    #[test]
    fn test_create_app_returns_router() {
        let _app = create_app(memory_state());
    }

    #[tokio::test]
    async fn test_contact_submission_end_to_end() {
        let app = app(memory_state());

        let (status, created) = send(&app, Method::POST, "/api/contact", Some(jane())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["id"], "msg-1");
        assert_eq!(created["status"], "unread");
        assert_eq!(created["timestamp"], "2026-10-18T09:30:00.000000Z");

        let (status, listed) = send(&app, Method::GET, "/api/contact?skip=0&limit=50", None).await;
        assert_eq!(status, StatusCode::OK);
        let listed = listed.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["name"], "Jane Doe");
        assert_eq!(listed[0]["id"], created["id"]);

        let (status, fetched) = send(&app, Method::GET, "/api/contact/msg-1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_contact_routes_accept_trailing_slash() {
        let app = app(memory_state());
        let (status, _) = send(&app, Method::POST, "/api/contact/", Some(jane())).await;
        assert_eq!(status, StatusCode::OK);
        let (status, listed) = send(&app, Method::GET, "/api/contact/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_email_is_rejected_and_not_stored() {
        let app = app(memory_state());
        let mut body = jane();
        body["email"] = json!("not-an-email");

        let (status, err) = send(&app, Method::POST, "/api/contact", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["error"], "Validation failed");
        assert_eq!(err["details"][0]["field"], "email");

        let (_, listed) = send(&app, Method::GET, "/api/contact", None).await;
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_message_length_bounds_are_validation_errors() {
        let app = app(memory_state());
        for message in ["too short".to_string(), "x".repeat(2001)] {
            let mut body = jane();
            body["message"] = json!(message);
            let (status, err) = send(&app, Method::POST, "/api/contact", Some(body)).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(err["details"][0]["field"], "message");
        }
    }

    #[tokio::test]
    async fn test_malformed_input_is_a_validation_error() {
        let app = app(memory_state());

        let req = Request::post("/api/contact")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(&app, Method::POST, "/api/contact", Some(json!(["a", "b"]))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, err) = send(&app, Method::GET, "/api/contact?limit=-1", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["details"][0]["field"], "query");
    }

    #[tokio::test]
    async fn test_status_update_via_query_and_body() {
        let app = app(memory_state());
        send(&app, Method::POST, "/api/contact", Some(jane())).await;

        let (status, body) = send(&app, Method::PATCH, "/api/contact/msg-1/status?status=read", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Status updated successfully");
        let (_, fetched) = send(&app, Method::GET, "/api/contact/msg-1", None).await;
        assert_eq!(fetched["status"], "read");

        let (status, _) = send(
            &app,
            Method::PATCH,
            "/api/contact/msg-1/status",
            Some(json!({ "status": "replied" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, fetched) = send(&app, Method::GET, "/api/contact/msg-1", None).await;
        assert_eq!(fetched["status"], "replied");
    }

    #[tokio::test]
    async fn test_status_update_failures() {
        let app = app(memory_state());
        send(&app, Method::POST, "/api/contact", Some(jane())).await;

        let (status, err) = send(&app, Method::PATCH, "/api/contact/msg-1/status?status=archived", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["error"], "Invalid status. Must be one of: unread, read, replied");
        let (_, fetched) = send(&app, Method::GET, "/api/contact/msg-1", None).await;
        assert_eq!(fetched["status"], "unread");

        let (status, err) = send(&app, Method::PATCH, "/api/contact/missing/status?status=read", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["error"], "Contact message not found");

        let (status, err) = send(&app, Method::PATCH, "/api/contact/msg-1/status", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err["details"][0]["field"], "status");
    }

    #[tokio::test]
    async fn test_unknown_ids_and_paths_are_not_found() {
        let app = app(memory_state());

        let (status, err) = send(&app, Method::GET, "/api/contact/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["error"], "Contact message not found");

        let (status, err) = send(&app, Method::GET, "/api/portfolio/projects/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["error"], "Project not found");

        let (status, err) = send(&app, Method::GET, "/api/nothing-here", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(err["error"], "Not Found");
    }

    #[tokio::test]
    async fn test_portfolio_endpoints_over_seeded_store() {
        let state = memory_state();
        seed::seed_database(state.store.as_ref(), &services::testing::SteppingClock::new())
            .await
            .unwrap();
        let app = app(state);

        let (status, stats) = send(&app, Method::GET, "/api/portfolio/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["total_projects"], 4);
        assert_eq!(stats["total_experience_entries"], 2);
        assert_eq!(stats["total_expertise_areas"], 4);
        assert_eq!(stats["years_experience"], 4);
        assert_eq!(stats["google_projects"], "10+");
        assert_eq!(
            stats["project_categories"],
            json!(["Conversational AI", "Enterprise AI", "Healthcare AI"])
        );

        let (_, projects) = send(
            &app,
            Method::GET,
            "/api/portfolio/projects?category=Conversational%20AI",
            None,
        )
        .await;
        let projects = projects.as_array().unwrap();
        assert_eq!(projects.len(), 2);
        assert!(projects.iter().all(|p| p["category"] == "Conversational AI"));

        let (_, limited) = send(&app, Method::GET, "/api/portfolio/projects?limit=1", None).await;
        assert_eq!(limited.as_array().unwrap().len(), 1);

        let (status, project) = send(&app, Method::GET, "/api/portfolio/projects/telus-faq-optimization", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(project["client"], "TELUS");

        let (_, experience) = send(&app, Method::GET, "/api/portfolio/experience", None).await;
        assert_eq!(experience[0]["id"], "capgemini-ccai-engineer");

        let (_, expertise) = send(
            &app,
            Method::GET,
            "/api/portfolio/expertise?category=DevOps%20%26%20Deployment",
            None,
        )
        .await;
        assert_eq!(expertise.as_array().unwrap().len(), 1);
        assert_eq!(expertise[0]["experience_level"], "Advanced");
    }

    async fn seeded_app() -> Router {
        let state = memory_state();
        seed::seed_database(state.store.as_ref(), &services::testing::SteppingClock::new())
            .await
            .unwrap();
        app(state)
    }

    #[tokio::test]
    async fn test_blank_category_lists_everything() {
        let app = seeded_app().await;

        let (status, projects) = send(&app, Method::GET, "/api/portfolio/projects?category=", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(projects.as_array().unwrap().len(), 4);

        let (status, expertise) = send(&app, Method::GET, "/api/portfolio/expertise?category=", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(expertise.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_seeded_projects_are_newest_first() {
        let app = seeded_app().await;

        let (_, projects) = send(&app, Method::GET, "/api/portfolio/projects", None).await;
        let projects = projects.as_array().unwrap();
        let ids: Vec<&str> = projects.iter().filter_map(|p| p["id"].as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "comcast-multi-flow-architecture",
                "nysd-healthcare-automation",
                "burger-king-ai-drive-thru",
                "telus-faq-optimization",
            ]
        );

        let stamps: Vec<&str> = projects.iter().filter_map(|p| p["created_at"].as_str()).collect();
        assert_eq!(stamps.len(), 4);
        assert!(stamps.windows(2).all(|w| w[0] > w[1]));
    }

    #[tokio::test]
    async fn test_store_failure_is_opaque_server_error() {
        let app = app(failing_state());

        for uri in ["/api/portfolio/projects", "/api/portfolio/stats", "/api/contact"] {
            let (status, err) = send(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(err, json!({ "error": "Internal server error" }));
        }

        let (status, _) = send(&app, Method::POST, "/api/contact", Some(jane())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_cors_preflight_mirrors_origin_with_credentials() {
        let app = app(memory_state());
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/contact")
            .header(header::ORIGIN, "https://portfolio.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let headers = res.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://portfolio.example"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let app = app(memory_state());
        let res = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(res.headers().contains_key("x-request-id"));
    }
}
