use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A registered account. Not `Serialize` so the password hash can never end
/// up in a response body; handlers expose `UserProfile` instead.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            created_at: Utc::now(),
            last_login: None,
        }
    }
}

/// One persisted question/answer exchange, owned by a single user and
/// immutable after creation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CodeSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub query: String,
    pub code_context: Option<String>,
    pub response: String,
    pub language: String,
    pub tokens_used: i32,
    pub created_at: DateTime<Utc>,
}

impl CodeSession {
    pub fn new(
        user_id: Uuid,
        query: String,
        code_context: Option<String>,
        response: String,
        language: String,
        tokens_used: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            query,
            code_context,
            response,
            language,
            tokens_used,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_has_no_last_login() {
        let user = User::new(
            "alice".to_string(),
            "a@x.com".to_string(),
            "$2b$12$hash".to_string(),
        );
        assert!(user.last_login.is_none());
        assert_eq!(user.username, "alice");
    }

    #[test]
    fn test_session_keeps_optional_context() {
        let session = CodeSession::new(
            Uuid::new_v4(),
            "How to sort a list?".to_string(),
            None,
            "Use sort().".to_string(),
            "python".to_string(),
            42,
        );
        assert!(session.code_context.is_none());
        assert_eq!(session.tokens_used, 42);
    }
}
