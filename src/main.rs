use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::{from_fn, Next},
    response::{Html, IntoResponse, Json, Redirect},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use masjidku::{auth, db, routes, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if it exists
    dotenvy::dotenv().ok();

    // Ensure critical environment variables are set
    env::var("JWT_SECRET").expect("JWT_SECRET must be set");

    // Initialize Tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "masjidku=info,tower_http=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting masjidku application...");

    let index_template = fs::read_to_string("static/index.html")?;

    tracing::info!("Initializing database connection pool...");
    let db_pool = db::init_pool()?;
    tracing::info!("Database connection pool initialized successfully");

    let state = AppState {
        db: db_pool,
        index_template,
    };

    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(
                env::var("RATE_LIMIT_PER_SECOND")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1200),
            )
            .burst_size(
                env::var("RATE_LIMIT_BURST")
                    .ok()
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(2400),
            )
            .finish()
            .expect("governor config"),
    );

    // CORS configuration (no permissive mode)
    let cors = {
        let env_mode = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());
        let origins = env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|v| {
                v.split(',')
                    .filter_map(|s| {
                        let trimmed = s.trim();
                        if trimmed.is_empty() {
                            return None;
                        }
                        match trimmed.parse::<HeaderValue>() {
                            Ok(value) => Some(value),
                            Err(_) => {
                                tracing::warn!("Ignoring invalid ALLOWED_ORIGINS entry: {}", trimmed);
                                None
                            }
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| {
                if env_mode == "production" {
                    panic!("ALLOWED_ORIGINS must be set in production")
                }
                vec![
                    HeaderValue::from_static("http://localhost:3000"),
                    HeaderValue::from_static("http://127.0.0.1:3000"),
                ]
            });

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .allow_credentials(true)
    };

    // Router Setup
    let app = Router::new()
        .route("/", get(serve_index))
        .route("/index.html", get(serve_index))
        .route("/health", get(health_check))
        // Public API
        .route("/api/cash", get(routes::cash::list_cash))
        .route(
            "/api/donations",
            get(routes::donations::public_list).post(routes::donations::submit),
        )
        .route("/api/appointments", post(routes::appointments::submit))
        .route("/api/news", get(routes::news::list))
        .route("/api/news/{id}", get(routes::news::get))
        .route("/api/events", get(routes::events::list))
        .route("/api/events/{id}", get(routes::events::get))
        .route("/api/staff", get(routes::staff::list))
        // Admin API
        .route(
            "/api/admin/cash",
            get(routes::cash::list_cash).post(routes::cash::create_cash),
        )
        .route("/api/admin/cash/summary", get(routes::cash::summary))
        .route("/api/admin/cash/monthly", get(routes::cash::monthly))
        .route(
            "/api/admin/cash/{id}",
            get(routes::cash::get_cash)
                .put(routes::cash::update_cash)
                .delete(routes::cash::delete_cash),
        )
        .route(
            "/api/admin/donations",
            get(routes::donations::admin_list).post(routes::donations::create),
        )
        .route("/api/admin/donations/stats", get(routes::donations::stats))
        .route(
            "/api/admin/donations/{id}",
            get(routes::donations::get)
                .put(routes::donations::update)
                .delete(routes::donations::delete),
        )
        .route(
            "/api/admin/appointments",
            get(routes::appointments::list).post(routes::appointments::create),
        )
        .route(
            "/api/admin/appointments/{id}",
            get(routes::appointments::get)
                .put(routes::appointments::update)
                .delete(routes::appointments::delete),
        )
        .route("/api/admin/news", post(routes::news::create))
        .route(
            "/api/admin/news/{id}",
            axum::routing::put(routes::news::update).delete(routes::news::delete),
        )
        .route("/api/admin/events", post(routes::events::create))
        .route(
            "/api/admin/events/{id}",
            axum::routing::put(routes::events::update).delete(routes::events::delete),
        )
        .route("/api/admin/staff", post(routes::staff::create))
        .route(
            "/api/admin/staff/{id}",
            get(routes::staff::get)
                .put(routes::staff::update)
                .delete(routes::staff::delete),
        )
        .route("/api/admin/reports/years", get(routes::reports::list_available_years))
        .route("/api/admin/reports/cash/export", get(routes::reports::export_cash))
        .route(
            "/api/admin/reports/donations/export",
            get(routes::reports::export_donations),
        )
        .route("/api/admin/me", get(auth::me))
        // Auth Routes
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .nest_service("/assets", ServeDir::new("static/assets"))
        .fallback(get(spa_fallback))
        .layer(from_fn(require_admin))
        .layer(cors)
        .layer(GovernorLayer::new(governor_config))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8080));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("signal received, starting graceful shutdown");
}

async fn health_check() -> &'static str {
    "OK"
}

/// Admin surfaces require a session: API callers get a JSON 401, browser page
/// loads are redirected to the login page.
async fn require_admin(req: Request<Body>, next: Next) -> impl IntoResponse {
    let path = req.uri().path();
    let is_admin_api = path.starts_with("/api/admin/");
    let is_admin_page = path == "/admin" || path.starts_with("/admin/");

    if req.method() == Method::OPTIONS || !(is_admin_api || is_admin_page) {
        return next.run(req).await;
    }

    if let Some(token) = auth::extract_token_from_headers(req.headers()) {
        if auth::validate_token_str(&token).is_ok() {
            return next.run(req).await;
        }
    }

    if is_admin_page {
        return Redirect::to("/login").into_response();
    }

    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "message": "Unauthorized" })),
    )
        .into_response()
}

async fn serve_index(State(state): State<AppState>) -> impl IntoResponse {
    Html(state.index_template.clone())
}

async fn spa_fallback(State(state): State<AppState>, req: Request<Body>) -> impl IntoResponse {
    let path = req.uri().path();
    if path.starts_with("/api/") {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "message": "Not found" })),
        )
            .into_response();
    }
    serve_index(State(state)).await.into_response()
}
