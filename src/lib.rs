//! City/service marketing site backend - library for app logic and testing

pub mod content;
pub mod context;
pub mod db;
pub mod error;
pub mod geo;
pub mod intake;
pub mod logging;
pub mod resolve;
pub mod routes;
pub mod seo;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                "http://localhost:3000".parse().unwrap(),
                "http://127.0.0.1:3000".parse().unwrap(),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app() -> Router {
    let cors = configure_cors();

    Router::new()
        // Page payload surfaces
        .route("/", get(routes::home::home))
        .route("/cities", get(routes::city::list_cities))
        .route("/services", get(routes::services::list_services))
        .route("/services/{slug}", get(routes::services::service_detail))
        .route("/blog", get(routes::blog::list_posts))
        .route("/blog/{slug}", get(routes::blog::get_post))
        .route("/blog/category/{slug}", get(routes::blog::category_posts))
        .route(
            "/contact",
            get(routes::contact::contact_form).post(routes::contact::submit_contact),
        )
        .route("/contact/success", get(routes::contact::contact_success))
        .route("/newsletter/signup", post(routes::newsletter::signup))
        .route("/resources", get(routes::resources::list_resources))
        .route(
            "/resources/{id}/download",
            post(routes::resources::claim_download),
        )
        // JSON projections for client-side consumption
        .route("/api/cities", get(routes::api::api_cities))
        .route("/api/services", get(routes::api::api_services))
        .route(
            "/api/city/{city_slug}/services",
            get(routes::api::api_city_services),
        )
        // Admin CRUD
        .route(
            "/api/admin/cities",
            get(routes::admin::list_cities).post(routes::admin::create_city),
        )
        .route(
            "/api/admin/cities/{id}",
            axum::routing::patch(routes::admin::update_city).delete(routes::admin::delete_city),
        )
        .route(
            "/api/admin/services",
            get(routes::admin::list_services).post(routes::admin::create_service),
        )
        .route(
            "/api/admin/services/{id}",
            axum::routing::patch(routes::admin::update_service)
                .delete(routes::admin::delete_service),
        )
        .route(
            "/api/admin/city-services",
            get(routes::admin::list_city_services).post(routes::admin::create_city_service),
        )
        .route(
            "/api/admin/city-services/{id}",
            axum::routing::patch(routes::admin::update_city_service)
                .delete(routes::admin::delete_city_service),
        )
        .route(
            "/api/admin/blog/categories",
            get(routes::admin::list_categories).post(routes::admin::create_category),
        )
        .route(
            "/api/admin/blog/categories/{id}",
            axum::routing::delete(routes::admin::delete_category),
        )
        .route(
            "/api/admin/blog/posts",
            get(routes::admin::list_posts).post(routes::admin::create_post),
        )
        .route(
            "/api/admin/blog/posts/{slug}",
            axum::routing::patch(routes::admin::update_post).delete(routes::admin::delete_post),
        )
        .route("/api/admin/leads", get(routes::admin::list_leads))
        .route(
            "/api/admin/leads/{id}",
            axum::routing::patch(routes::admin::update_lead),
        )
        .route(
            "/api/admin/subscribers",
            get(routes::admin::list_subscribers),
        )
        .route(
            "/api/admin/resources",
            post(routes::admin::create_resource),
        )
        .route(
            "/api/admin/resources/{id}",
            axum::routing::delete(routes::admin::delete_resource),
        )
        // Feeds & health
        .route("/sitemap.xml", get(routes::sitemap::sitemap_xml))
        .route("/rss.xml", get(routes::rss::rss_feed))
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/database", get(routes::health::health_database))
        .route("/health/ready", get(routes::health::health_ready))
        // Slug-resolved surfaces: the single-segment fallback and the
        // city-scoped sub-pages. Static prefixes above always win.
        .route(
            "/{slug}",
            get(routes::city::resolve_entry).post(routes::city::submit_city_service_contact),
        )
        .route("/{slug}/services", get(routes::city::city_services))
        .route("/{slug}/blog", get(routes::city::city_blog))
        .route(
            "/{slug}/contact",
            get(routes::city::city_contact_form).post(routes::city::submit_city_contact),
        )
        .layer(middleware::from_fn(geo::detect_city))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        // Global 2 MB request body cap - prevents unbounded buffering
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(cors)
}

/// Run the server (used by main).
pub async fn run() {
    dotenvy::dotenv().ok();

    let _log_guards = logging::init();

    routes::health::init_start_time();

    if std::env::var("DATABASE_URL").is_ok() {
        match db::init_pool(None).await {
            Ok(pool) => {
                if let Err(e) = db::run_migrations(&pool).await {
                    tracing::error!("Failed to run database migrations: {}", e);
                } else if let Err(e) = db::seed::run_if_empty(&pool).await {
                    tracing::error!("Failed to seed initial data: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize database pool: {}. Continuing without database.",
                    e
                );
            }
        }
    } else {
        tracing::info!("DATABASE_URL not set. Running without database connection.");
    }

    let app = create_app();

    // Bind address is configurable via HOST / PORT env vars.
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3001);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Invalid HOST/PORT configuration");
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    #[test]
    fn test_create_app_returns_router() {
        let _app = create_app();
    }

    #[tokio::test]
    async fn test_unavailable_without_pool() {
        // Every store-backed surface answers 503 when no pool is configured.
        if crate::db::get_pool().is_some() {
            return;
        }
        for uri in ["/api/cities", "/services", "/blog"] {
            let app = create_app();
            let res = app
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_contact_validation_runs_before_store_access() {
        // An empty form is rejected with field errors even with no database.
        let app = create_app();
        let res = app
            .oneshot(
                Request::post("/contact")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(""))
                    .unwrap(),
            )
            .await
            .unwrap();
        // Without a pool the handler bails out 503 first; with one it must be
        // a 422 with field errors. Either way, never a 2xx.
        assert!(
            res.status() == StatusCode::UNPROCESSABLE_ENTITY
                || res.status() == StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_health_is_always_up() {
        let app = create_app();
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
