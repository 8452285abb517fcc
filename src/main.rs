use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod auth;
mod config;
mod database;
mod error;
mod filter;
mod handlers;
mod middleware;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = crate::config::config();
    tracing::info!("Starting catalog API in {:?} mode", config.environment);

    if let Err(e) = database::manager::DatabaseManager::migrate().await {
        tracing::error!("Failed to apply database migrations: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = bootstrap_admin().await {
        tracing::error!("Failed to bootstrap admin user: {}", e);
        std::process::exit(1);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("CATALOG_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Catalog API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Auth (register/login/refresh public, logout authenticated)
        .merge(auth_routes())
        // Catalog resources (authenticated, writes staff-only)
        .merge(catalog_routes())
        // User administration (staff-only)
        .merge(user_routes())
        // Global middleware
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn auth_routes() -> Router {
    use axum::routing::post;
    use handlers::auth;

    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/token/refresh", post(auth::refresh))
        .merge(
            Router::new()
                .route("/logout", post(auth::logout))
                .layer(axum::middleware::from_fn(middleware::auth::jwt_auth_middleware)),
        )
}

fn catalog_routes() -> Router {
    use handlers::{catalog, characters, editions, pets, skullectors};

    Router::new()
        // Full nested view; writes are shared with /personajes
        .route("/todos", get(catalog::list).post(characters::create))
        .route(
            "/todos/:id",
            get(catalog::retrieve)
                .put(characters::update)
                .patch(characters::partial_update)
                .delete(characters::destroy),
        )
        .route("/personajes", get(characters::list).post(characters::create))
        .route(
            "/personajes/:id",
            get(characters::retrieve)
                .put(characters::update)
                .patch(characters::partial_update)
                .delete(characters::destroy),
        )
        .route("/mascotas", get(pets::list).post(pets::create))
        .route(
            "/mascotas/:id",
            get(pets::retrieve)
                .put(pets::update)
                .patch(pets::partial_update)
                .delete(pets::destroy),
        )
        .route("/ediciones", get(editions::list).post(editions::create))
        .route(
            "/ediciones/:id",
            get(editions::retrieve)
                .put(editions::update)
                .patch(editions::partial_update)
                .delete(editions::destroy),
        )
        .route("/skullectors", get(skullectors::list).post(skullectors::create))
        .route(
            "/skullectors/:id",
            get(skullectors::retrieve)
                .put(skullectors::update)
                .patch(skullectors::partial_update)
                .delete(skullectors::destroy),
        )
        // Innermost to outermost: permission check runs after auth
        .layer(axum::middleware::from_fn(middleware::auth::admin_or_read_only_middleware))
        .layer(axum::middleware::from_fn(middleware::auth::jwt_auth_middleware))
}

fn user_routes() -> Router {
    use handlers::users;

    Router::new()
        .route("/usuarios", get(users::list).post(users::create))
        .route(
            "/usuarios/:id",
            get(users::retrieve)
                .put(users::update)
                .patch(users::partial_update)
                .delete(users::destroy),
        )
        .layer(axum::middleware::from_fn(middleware::auth::staff_only_middleware))
        .layer(axum::middleware::from_fn(middleware::auth::jwt_auth_middleware))
}

/// Create the staff account named by CATALOG_ADMIN_USERNAME /
/// CATALOG_ADMIN_PASSWORD (and optional CATALOG_ADMIN_EMAIL) when it does
/// not exist yet. Replaces the framework's interactive superuser setup.
async fn bootstrap_admin() -> Result<(), error::ApiError> {
    let (username, password) = match (
        std::env::var("CATALOG_ADMIN_USERNAME"),
        std::env::var("CATALOG_ADMIN_PASSWORD"),
    ) {
        (Ok(u), Ok(p)) if !u.is_empty() && !p.is_empty() => (u, p),
        _ => return Ok(()),
    };
    let email = std::env::var("CATALOG_ADMIN_EMAIL")
        .unwrap_or_else(|_| format!("{}@localhost.local", username));

    let pool = database::manager::DatabaseManager::pool().await?;
    let existing = database::repository::Repository::<database::models::user::User>::new(
        "users",
        pool.clone(),
    )
    .exists(json!({ "username": &username }))
    .await?;
    if existing {
        return Ok(());
    }

    let password_hash = auth::password::hash_password(&password)?;
    sqlx::query(
        "INSERT INTO users (username, email, password_hash, is_staff) VALUES ($1, $2, $3, TRUE)",
    )
    .bind(&username)
    .bind(&email)
    .bind(&password_hash)
    .execute(&pool)
    .await
    .map_err(database::manager::DatabaseError::from)?;

    tracing::info!("Created admin user {}", username);
    Ok(())
}

fn cors_layer() -> CorsLayer {
    if config::config().security.enable_cors {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    }
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Monster Catalog API",
        "version": version,
        "description": "Collectibles catalog REST API built with Rust (Axum)",
        "endpoints": {
            "auth": "/register, /login, /logout, /token/refresh",
            "catalog": "/todos, /personajes, /mascotas, /ediciones, /skullectors (authenticated)",
            "users": "/usuarios (staff)",
            "health": "/health (public)",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "error": "database unavailable",
                "database_error": e.to_string()
            })),
        ),
    }
}
