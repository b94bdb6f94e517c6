use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use validator::Validate;

use crate::error::{parse_object_id, ApiError};
use crate::extractors::AppJson;
use crate::middlewares::auth::JwtClaims;
use crate::models::user::{LoginRequest, RegisterRequest, UserProfile};
use crate::models::ApiResponse;
use crate::services::auth_service::AuthService;
use crate::services::AppState;

fn service(state: &AppState) -> AuthService {
    let jwt = crate::middlewares::auth::JwtService::new(&state.config.jwt_secret);
    AuthService::new(state.mongo.clone(), jwt)
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<Response, ApiError> {
    req.validate()?;
    let response = service(&state).register(req).await?;
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Response, ApiError> {
    req.validate()?;
    let response = service(&state).login(req).await?;
    Ok(Json(response).into_response())
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let user_id = parse_object_id(&claims.sub, "user")?;
    let user = service(&state).get_user_by_id(&user_id).await?;
    Ok(Json(ApiResponse::new(UserProfile::from(user))))
}
