use crate::error::{AppError, AuthError};
use crate::AppState;
use actix_web::http::header;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use tracing::debug;
use uuid::Uuid;

/// Identity bound to a request once the bearer token has been validated.
///
/// Protected handlers take this as an argument; extraction failure is the
/// 401 rejection, so a handler body only ever sees an authenticated caller.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate_request(req))
    }
}

fn authenticate_request(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::InternalError("Application state is not configured".into()))?;

    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = extract_bearer_token(header)?;

    let user_id = state.tokens.validate(token).map_err(|e| {
        debug!("Token validation failed: {}", e);
        e
    })?;

    Ok(AuthenticatedUser { user_id })
}

/// Pulls the token out of an `Authorization` header value.
///
/// Each malformed shape is a distinct rejection: missing header, wrong
/// scheme, missing token, or extra tokens after the credential.
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingHeader)?;

    let parts: Vec<&str> = header.split_whitespace().collect();
    let scheme = parts.first().ok_or(AuthError::MissingHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidScheme);
    }
    if parts.len() == 1 {
        return Err(AuthError::MissingToken);
    }
    if parts.len() > 2 {
        return Err(AuthError::MalformedHeader);
    }

    Ok(parts[1])
}
