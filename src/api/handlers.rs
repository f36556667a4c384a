use crate::assistant::is_supported_language;
use crate::auth::AuthenticatedUser;
use crate::db::models::CodeSession;
use crate::error::AppError;
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CodeAssistRequest {
    pub query: Option<String>,
    pub code_context: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CodeAssistResponse {
    pub success: bool,
    pub response: String,
    pub tokens_used: i32,
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub sessions: Vec<CodeSession>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub session: CodeSession,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

pub async fn code_assistance(
    user: AuthenticatedUser,
    req: web::Json<CodeAssistRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let query = match req.query.as_deref() {
        Some(q) if !q.trim().is_empty() => q,
        _ => return Err(AppError::ValidationError("Query is required".into())),
    };
    let code_context = req.code_context.as_deref().unwrap_or("");
    let language = req.language.as_deref().unwrap_or("python");

    if !is_supported_language(language) {
        return Err(AppError::ValidationError(format!(
            "Unsupported language: {}",
            language
        )));
    }

    debug!("Processing code assist request for user {}", user.user_id);

    let reply = state
        .assistant
        .process(query, code_context, language)
        .await
        .map_err(|e| {
            error!("Code assistant processing failed: {}", e);
            AppError::AssistantError(e)
        })?;

    // Persistence is best-effort: a failed insert is logged and reported as
    // a null session id, never as a failed request.
    let session = CodeSession::new(
        user.user_id,
        query.to_string(),
        (!code_context.is_empty()).then(|| code_context.to_string()),
        reply.response.clone(),
        language.to_string(),
        reply.tokens_used,
    );
    let session_id = match state.db.create_code_session(&session).await {
        Ok(saved) => {
            debug!("Saved code session {} for user {}", saved.id, user.user_id);
            Some(saved.id)
        }
        Err(e) => {
            error!("Error saving code session: {}", e);
            None
        }
    };

    Ok(HttpResponse::Ok().json(CodeAssistResponse {
        success: true,
        response: reply.response,
        tokens_used: reply.tokens_used,
        session_id,
    }))
}

pub async fn get_history(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    debug!("Getting history for user {}", user.user_id);

    let sessions = state.db.list_sessions_for_user(user.user_id).await?;
    debug!("Found {} sessions for user {}", sessions.len(), user.user_id);

    Ok(HttpResponse::Ok().json(HistoryResponse {
        success: true,
        sessions,
    }))
}

pub async fn get_session(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    debug!("Getting session {} for user {}", session_id, user.user_id);

    let session = state
        .db
        .get_session_for_user(session_id, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".into()))?;

    Ok(HttpResponse::Ok().json(SessionResponse {
        success: true,
        session,
    }))
}

pub async fn delete_session(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let session_id = path.into_inner();
    debug!("Deleting session {} for user {}", session_id, user.user_id);

    let deleted = state
        .db
        .delete_session_for_user(session_id, user.user_id)
        .await?;
    if !deleted {
        return Err(AppError::NotFound("Session not found".into()));
    }

    Ok(HttpResponse::Ok().json(MessageResponse {
        success: true,
        message: format!("Session {} deleted successfully", session_id),
    }))
}

/// Always succeeds, even when there was nothing to clear.
pub async fn clear_history(
    user: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let removed = state.db.clear_sessions_for_user(user.user_id).await?;
    debug!("Cleared {} sessions for user {}", removed, user.user_id);

    Ok(HttpResponse::Ok().json(MessageResponse {
        success: true,
        message: "History cleared successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::MockAssistant;
    use crate::auth::{AuthService, TokenService};
    use crate::config::Settings;
    use crate::db::DbOperations;
    use actix_web::{test, App};
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;

    // A lazy pool never connects, so these tests exercise the gate and the
    // input validation paths without a database.
    fn lazy_state(assistant: MockAssistant) -> (web::Data<AppState>, String) {
        let settings = Settings::new_for_test().unwrap();
        let pool = PgPoolOptions::new()
            .connect_lazy(&settings.database.url)
            .unwrap();
        let db = Arc::new(DbOperations::new(Arc::new(pool)));
        let tokens = Arc::new(TokenService::new(
            settings.auth.jwt_secret.clone(),
            settings.auth.token_expiry_hours,
        ));
        let auth = Arc::new(AuthService::new(db.clone(), tokens.clone()));
        let token = tokens.issue(Uuid::new_v4()).unwrap();

        let state = web::Data::new(AppState {
            config: Arc::new(settings),
            db,
            tokens,
            auth,
            assistant: Arc::new(assistant),
        });
        (state, token)
    }

    #[actix_web::test]
    async fn test_empty_query_rejected_before_assistant_call() {
        let mut assistant = MockAssistant::new();
        assistant.expect_process().times(0);

        let (state, token) = lazy_state(assistant);
        let app = test::init_service(
            App::new()
                .app_data(state)
                .route("/api/code-assist", web::post().to(code_assistance)),
        )
        .await;

        for body in [
            serde_json::json!({}),
            serde_json::json!({"query": ""}),
            serde_json::json!({"query": "   "}),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/code-assist")
                .insert_header(("Authorization", format!("Bearer {}", token)))
                .set_json(body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 400);
        }
    }

    #[actix_web::test]
    async fn test_unsupported_language_rejected_before_assistant_call() {
        let mut assistant = MockAssistant::new();
        assistant.expect_process().times(0);

        let (state, token) = lazy_state(assistant);
        let app = test::init_service(
            App::new()
                .app_data(state)
                .route("/api/code-assist", web::post().to(code_assistance)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/code-assist")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(serde_json::json!({"query": "How to sort?", "language": "cobol"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_assistant_failure_maps_to_500() {
        let mut assistant = MockAssistant::new();
        assistant
            .expect_process()
            .times(1)
            .returning(|_, _, _| Err(crate::error::AssistantError::RateLimited));

        let (state, token) = lazy_state(assistant);
        let app = test::init_service(
            App::new()
                .app_data(state)
                .route("/api/code-assist", web::post().to(code_assistance)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/code-assist")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(serde_json::json!({"query": "How to sort?"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(
            body["error"]["message"],
            "Completion API rate limit exceeded"
        );
    }

    #[actix_web::test]
    async fn test_protected_route_rejects_missing_and_bad_tokens() {
        let mut assistant = MockAssistant::new();
        assistant.expect_process().times(0);

        let (state, _token) = lazy_state(assistant);
        let app = test::init_service(
            App::new()
                .app_data(state)
                .route("/api/code-assist", web::post().to(code_assistance)),
        )
        .await;

        // No header at all.
        let req = test::TestRequest::post()
            .uri("/api/code-assist")
            .set_json(serde_json::json!({"query": "q"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);

        // Wrong scheme, missing token, extra tokens, garbage token.
        for header in ["Basic abc", "Bearer", "Bearer a b", "Bearer not.a.jwt"] {
            let req = test::TestRequest::post()
                .uri("/api/code-assist")
                .insert_header(("Authorization", header))
                .set_json(serde_json::json!({"query": "q"}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 401, "header {:?} should be rejected", header);
        }
    }
}
