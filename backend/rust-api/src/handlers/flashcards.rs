use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use validator::Validate;

use crate::error::{parse_object_id, ApiError};
use crate::extractors::AppJson;
use crate::middlewares::auth::JwtClaims;
use crate::models::flashcard::{
    CreateFlashcardRequest, FlashcardView, StudyQuery, UpdateFlashcardRequest,
};
use crate::models::{ApiResponse, Difficulty, ListQuery};
use crate::services::flashcard_service::FlashcardService;
use crate::services::AppState;

fn service(state: &AppState) -> FlashcardService {
    FlashcardService::new(state.mongo.clone())
}

pub async fn list_flashcards(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    let response = service(&state).list(&query).await?;
    Ok(Json(response).into_response())
}

pub async fn get_flashcard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FlashcardView>>, ApiError> {
    let id = parse_object_id(&id, "flashcard")?;
    let card = service(&state).get(&id).await?;
    Ok(Json(ApiResponse::new(card)))
}

pub async fn create_flashcard(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<CreateFlashcardRequest>,
) -> Result<Response, ApiError> {
    req.validate()?;
    let user_id = parse_object_id(&claims.sub, "user")?;
    let card = service(&state).create(&user_id, req).await?;
    let body = ApiResponse::with_message("Flashcard created successfully", card);
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

pub async fn update_flashcard(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateFlashcardRequest>,
) -> Result<Json<ApiResponse<FlashcardView>>, ApiError> {
    req.validate()?;
    let id = parse_object_id(&id, "flashcard")?;
    let user_id = parse_object_id(&claims.sub, "user")?;
    let card = service(&state).update(&id, &user_id, req).await?;
    Ok(Json(ApiResponse::with_message(
        "Flashcard updated successfully",
        card,
    )))
}

pub async fn delete_flashcard(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_object_id(&id, "flashcard")?;
    let user_id = parse_object_id(&claims.sub, "user")?;
    service(&state).delete(&id, &user_id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Flashcard deleted successfully",
    })))
}

pub async fn flashcards_by_difficulty(
    State(state): State<Arc<AppState>>,
    Path(level): Path<String>,
) -> Result<Json<ApiResponse<Vec<FlashcardView>>>, ApiError> {
    let difficulty = Difficulty::parse(&level)
        .ok_or_else(|| ApiError::BadRequest("Invalid difficulty level".to_string()))?;
    let cards = service(&state).by_difficulty(difficulty).await?;
    Ok(Json(ApiResponse::new(cards)))
}

pub async fn flashcards_by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<ApiResponse<Vec<FlashcardView>>>, ApiError> {
    let cards = service(&state).by_category(&category).await?;
    Ok(Json(ApiResponse::new(cards)))
}

pub async fn my_flashcards(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<Json<ApiResponse<Vec<FlashcardView>>>, ApiError> {
    let user_id = parse_object_id(&claims.sub, "user")?;
    let cards = service(&state).my_cards(&user_id).await?;
    Ok(Json(ApiResponse::new(cards)))
}

pub async fn random_study_set(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StudyQuery>,
) -> Result<Json<ApiResponse<Vec<FlashcardView>>>, ApiError> {
    let cards = service(&state).random_study_set(&query).await?;
    Ok(Json(ApiResponse::new(cards)))
}
