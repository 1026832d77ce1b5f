//! HTTP routes: tool surface and pool admin.

use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use grokrelay_core::adapter::InvocationResult;
use grokrelay_types::{PoolError, RelayError};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/tools/converse", post(converse))
        .route("/tools/generate-image", post(generate_image))
        .route("/tools/generate-video", post(generate_video))
        .route("/tools/models", get(list_models))
        .route("/admin/tokens", get(list_tokens).post(add_token).delete(remove_token))
        .route("/admin/tokens/reset", post(reset_token))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Static bearer auth; disabled when no key is configured.
async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if provided == Some(expected) {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "message": "invalid or missing API key", "type": "unauthorized" } })),
        )
            .into_response()
    }
}

/// RelayError mapped onto an HTTP status and a message-bearing body.
struct ApiError(RelayError);

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let error_type = match &self.0 {
            RelayError::Pool(PoolError::NoTokenAvailable) => "no_token_available",
            RelayError::Pool(_) => "pool_error",
            RelayError::Invocation(_) => "invocation_failed",
        };
        let body = Json(json!({
            "error": { "message": self.0.to_string(), "type": error_type }
        }));
        (status, body).into_response()
    }
}

fn result_body(result: InvocationResult) -> Json<serde_json::Value> {
    let content = match result {
        InvocationResult::Text(text) => text,
        InvocationResult::ImageMarkdown(block) => block,
        InvocationResult::VideoTag(tag) => tag,
    };
    Json(json!({ "result": content }))
}

// ===== Tool surface =====

#[derive(Deserialize)]
struct ConverseBody {
    query: String,
    model: Option<String>,
    system_prompt: Option<String>,
}

async fn converse(
    State(state): State<AppState>,
    Json(body): Json<ConverseBody>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .tools
        .converse(&body.query, body.model.as_deref(), body.system_prompt.as_deref())
        .await?;
    Ok(result_body(result))
}

#[derive(Deserialize)]
struct GenerateImageBody {
    prompt: String,
    n: Option<u32>,
    model: Option<String>,
}

async fn generate_image(
    State(state): State<AppState>,
    Json(body): Json<GenerateImageBody>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .tools
        .generate_image(&body.prompt, body.n, body.model.as_deref())
        .await?;
    Ok(result_body(result))
}

#[derive(Deserialize)]
struct GenerateVideoBody {
    image_url: String,
    prompt: String,
    model: Option<String>,
}

async fn generate_video(
    State(state): State<AppState>,
    Json(body): Json<GenerateVideoBody>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .tools
        .generate_video(&body.image_url, &body.prompt, body.model.as_deref())
        .await?;
    Ok(result_body(result))
}

async fn list_models(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "models": state.tools.list_models() }))
}

// ===== Pool admin =====

#[derive(Deserialize)]
struct TokenBody {
    token: String,
}

async fn list_tokens(State(state): State<AppState>) -> impl IntoResponse {
    let tokens: Vec<_> = state
        .pool
        .snapshot()
        .into_iter()
        .map(|record| {
            json!({
                "token": mask(&record.value),
                "status": record.status,
                "last_refreshed_at": record.last_refreshed_at,
                "cooldown_until": record.cooldown_until,
            })
        })
        .collect();
    Json(json!({ "tokens": tokens }))
}

async fn add_token(
    State(state): State<AppState>,
    Json(body): Json<TokenBody>,
) -> Result<impl IntoResponse, ApiError> {
    state.pool.insert(&body.token).map_err(RelayError::from)?;
    Ok((StatusCode::CREATED, Json(json!({ "added": mask(&body.token) }))))
}

async fn remove_token(
    State(state): State<AppState>,
    Json(body): Json<TokenBody>,
) -> impl IntoResponse {
    if state.pool.remove(&body.token) {
        Json(json!({ "removed": true })).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "message": "unknown token", "type": "not_found" } })),
        )
            .into_response()
    }
}

async fn reset_token(
    State(state): State<AppState>,
    Json(body): Json<TokenBody>,
) -> impl IntoResponse {
    if state.pool.reset(&body.token) {
        Json(json!({ "reset": true })).into_response()
    } else {
        (
            StatusCode::CONFLICT,
            Json(json!({ "error": { "message": "token not exhausted or unknown", "type": "conflict" } })),
        )
            .into_response()
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "grokrelay",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Shorten a credential for API output.
fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        "***".to_string()
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_short_and_long_values() {
        assert_eq!(mask("short"), "***");
        assert_eq!(mask("sso-alpha-0001"), "sso-…0001");
    }
}
