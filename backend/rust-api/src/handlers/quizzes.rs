use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use validator::Validate;

use crate::error::{parse_object_id, ApiError};
use crate::extractors::AppJson;
use crate::middlewares::auth::JwtClaims;
use crate::models::attempt::QuizStatistics;
use crate::models::quiz::{CreateQuizRequest, PublicQuizView, QuizView, UpdateQuizRequest};
use crate::models::{ApiResponse, ListQuery};
use crate::services::attempt_service::AttemptService;
use crate::services::quiz_service::QuizService;
use crate::services::AppState;

fn service(state: &AppState) -> QuizService {
    QuizService::new(state.mongo.clone())
}

pub async fn list_quizzes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let response = service(&state).list(&query).await?;
    Ok(Json(response).into_response())
}

pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PublicQuizView>>, ApiError> {
    let id = parse_object_id(&id, "quiz")?;
    let quiz = service(&state).get_public(&id).await?;
    Ok(Json(ApiResponse::new(quiz)))
}

pub async fn create_quiz(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<CreateQuizRequest>,
) -> Result<Response, ApiError> {
    req.validate()?;
    let user_id = parse_object_id(&claims.sub, "user")?;
    let quiz = service(&state).create(&user_id, req).await?;
    let body = ApiResponse::with_message("Quiz created successfully", quiz);
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

pub async fn update_quiz(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateQuizRequest>,
) -> Result<Json<ApiResponse<QuizView>>, ApiError> {
    req.validate()?;
    let id = parse_object_id(&id, "quiz")?;
    let user_id = parse_object_id(&claims.sub, "user")?;
    let quiz = service(&state).update(&id, &user_id, req).await?;
    Ok(Json(ApiResponse::with_message(
        "Quiz updated successfully",
        quiz,
    )))
}

pub async fn delete_quiz(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_object_id(&id, "quiz")?;
    let user_id = parse_object_id(&claims.sub, "user")?;
    service(&state).delete(&id, &user_id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Quiz deleted successfully",
    })))
}

pub async fn my_quizzes(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<Json<ApiResponse<Vec<QuizView>>>, ApiError> {
    let user_id = parse_object_id(&claims.sub, "user")?;
    let quizzes = service(&state).my_quizzes(&user_id).await?;
    Ok(Json(ApiResponse::new(quizzes)))
}

pub async fn quiz_statistics(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<QuizStatistics>>, ApiError> {
    let id = parse_object_id(&id, "quiz")?;
    let user_id = parse_object_id(&claims.sub, "user")?;
    let stats = AttemptService::new(state.mongo.clone())
        .quiz_statistics(&id, &user_id)
        .await?;
    Ok(Json(ApiResponse::new(stats)))
}
