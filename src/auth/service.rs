use crate::auth::token::TokenService;
use crate::db::models::User;
use crate::db::DbOperations;
use crate::error::{AppError, AuthError, DatabaseError};
use std::sync::Arc;
use tracing::{debug, info};

pub struct AuthService {
    db: Arc<DbOperations>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(db: Arc<DbOperations>, tokens: Arc<TokenService>) -> Self {
        Self { db, tokens }
    }

    /// Creates an account and issues its first token.
    ///
    /// Username and email are checked before the insert; a concurrent
    /// registration that slips past the checks still hits the unique
    /// constraints at commit and is reported as a duplicate, not a 500.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(User, String), AppError> {
        if self.db.get_user_by_username(username).await?.is_some() {
            return Err(AppError::ValidationError("Username already exists".into()));
        }
        if self.db.get_user_by_email(email).await?.is_some() {
            return Err(AppError::ValidationError("Email already exists".into()));
        }

        let password_hash = hash_password(password.to_string()).await?;
        let user = User::new(username.to_string(), email.to_string(), password_hash);

        let user = match self.db.create_user(&user).await {
            Ok(user) => user,
            Err(AppError::DatabaseError(DatabaseError::Duplicate)) => {
                // Lost a race with a concurrent registration; the constraint
                // name is gone by this point, so the message names both.
                return Err(AppError::ValidationError("Username or email already exists".into()));
            }
            Err(e) => return Err(e),
        };

        let token = self.tokens.issue(user.id)?;
        info!("Registered user {} ({})", user.username, user.id);

        Ok((user, token))
    }

    /// Verifies credentials and issues a fresh token.
    ///
    /// Unknown username and wrong password are indistinguishable to the
    /// caller.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(User, String), AppError> {
        let user = match self.db.get_user_by_username(username).await? {
            Some(user) => user,
            None => {
                debug!("Login attempt for unknown username");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !verify_password(password.to_string(), user.password_hash.clone()).await? {
            debug!("Password mismatch for user {}", user.id);
            return Err(AuthError::InvalidCredentials.into());
        }

        self.db.update_last_login(user.id).await?;
        let token = self.tokens.issue(user.id)?;
        info!("Login successful for user {}", user.id);

        Ok((user, token))
    }
}

/// bcrypt is CPU-bound, so both directions run off the async runtime.
async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))
}

async fn verify_password(password: String, password_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(&password, &password_hash))
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {}", e)))
}
