pub mod api;
pub mod assistant;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;

use crate::assistant::{Assistant, CodeAssistant};
use crate::auth::{AuthService, TokenService};
use crate::db::DbOperations;
use actix_web::{web, HttpResponse};
use std::sync::Arc;
use std::time::Duration;

pub use config::Settings;
pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db: Arc<DbOperations>,
    pub tokens: Arc<TokenService>,
    pub auth: Arc<AuthService>,
    pub assistant: Arc<dyn Assistant>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let db = Arc::new(
            DbOperations::new_with_options(
                &config.database.url,
                config.database.max_connections,
                Duration::from_secs(5),
            )
            .await?,
        );

        sqlx::migrate!()
            .run(db.pool())
            .await
            .map_err(|e| AppError::InternalError(format!("Migration failed: {}", e)))?;

        let tokens = Arc::new(TokenService::new(
            config.auth.jwt_secret.clone(),
            config.auth.token_expiry_hours,
        ));
        let auth = Arc::new(AuthService::new(db.clone(), tokens.clone()));
        let assistant: Arc<dyn Assistant> = Arc::new(CodeAssistant::new(&config.assistant));

        Ok(Self {
            config: Arc::new(config),
            db,
            tokens,
            auth,
            assistant,
        })
    }
}

/// Routing table, shared by `main` and the integration tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check)).service(
        web::scope("/api")
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::handlers::register))
                    .route("/login", web::post().to(auth::handlers::login)),
            )
            .route("/code-assist", web::post().to(api::handlers::code_assistance))
            .route("/history", web::get().to(api::handlers::get_history))
            // `clear` must come before the `{id}` routes so it never parses
            // as a session id.
            .route("/history/clear", web::delete().to(api::handlers::clear_history))
            .route("/history/{id}", web::get().to(api::handlers::get_session))
            .route("/history/{id}", web::delete().to(api::handlers::delete_session)),
    );
}
