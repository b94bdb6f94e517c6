use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use crate::error::{parse_object_id, ApiError};
use crate::extractors::AppJson;
use crate::middlewares::auth::JwtClaims;
use crate::models::attempt::{CompleteAttemptRequest, MyAttemptView, SubmitAnswerRequest};
use crate::models::ApiResponse;
use crate::services::attempt_service::AttemptService;
use crate::services::AppState;

fn service(state: &AppState) -> AttemptService {
    AttemptService::new(state.mongo.clone())
}

/// Starts an attempt, or picks up the caller's incomplete attempt on the
/// same quiz. 201 for a fresh attempt, 200 when resuming.
pub async fn start_attempt(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let quiz_id = parse_object_id(&id, "quiz")?;
    let user_id = parse_object_id(&claims.sub, "user")?;

    let outcome = service(&state).start(&quiz_id, &user_id).await?;
    let (code, message) = if outcome.resumed {
        (StatusCode::OK, "Resuming existing attempt")
    } else {
        (StatusCode::CREATED, "Quiz attempt started")
    };

    let body = ApiResponse::with_message(message, outcome.attempt);
    Ok((code, Json(body)).into_response())
}

pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(attempt_id): Path<String>,
    AppJson(req): AppJson<SubmitAnswerRequest>,
) -> Result<Response, ApiError> {
    let attempt_id = parse_object_id(&attempt_id, "attempt")?;
    let user_id = parse_object_id(&claims.sub, "user")?;

    let data = service(&state)
        .submit_answer(&attempt_id, &user_id, &req)
        .await?;
    let body = ApiResponse::with_message("Answer submitted successfully", data);
    Ok(Json(body).into_response())
}

pub async fn complete_attempt(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(attempt_id): Path<String>,
    req: Option<AppJson<CompleteAttemptRequest>>,
) -> Result<Response, ApiError> {
    let attempt_id = parse_object_id(&attempt_id, "attempt")?;
    let user_id = parse_object_id(&claims.sub, "user")?;
    let time_spent = req.and_then(|AppJson(r)| r.time_spent);

    let data = service(&state)
        .complete(&attempt_id, &user_id, time_spent)
        .await?;
    let body = ApiResponse::with_message("Quiz completed successfully", data);
    Ok(Json(body).into_response())
}

pub async fn my_attempts(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<Json<ApiResponse<Vec<MyAttemptView>>>, ApiError> {
    let user_id = parse_object_id(&claims.sub, "user")?;
    let attempts = service(&state).my_attempts(&user_id).await?;
    Ok(Json(ApiResponse::new(attempts)))
}
