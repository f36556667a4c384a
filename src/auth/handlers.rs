use crate::db::models::User;
use crate::error::AppError;
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Public view of an account; the password hash never leaves the db layer.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, AppError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::ValidationError(format!("{} is required", field))),
    }
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let username = required(&req.username, "username")?;
    let email = required(&req.email, "email")?;
    let password = required(&req.password, "password")?;

    info!("Received registration request for username: {}", username);

    match state.auth.register(username, email, password).await {
        Ok((user, token)) => Ok(HttpResponse::Created().json(RegisterResponse {
            message: "User registered successfully".to_string(),
            token,
            user: UserProfile::from(&user),
        })),
        Err(e) => {
            error!("Registration failed for username {}: {}", username, e);
            Err(e)
        }
    }
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let username = required(&req.username, "username")?;
    let password = required(&req.password, "password")?;

    info!("Login attempt for username: {}", username);

    match state.auth.authenticate(username, password).await {
        Ok((user, token)) => Ok(HttpResponse::Ok().json(LoginResponse {
            token,
            user: UserProfile::from(&user),
        })),
        Err(e) => {
            info!("Login failed for username {}: {}", username, e);
            Err(e)
        }
    }
}
