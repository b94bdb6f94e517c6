use axum::{
    extract::{FromRequest, OptionalFromRequest, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Custom JSON extractor that returns JSON error responses instead of HTML
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match <Json<T> as FromRequest<S>>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => {
                let message = format!("Failed to parse JSON request body: {}", rejection);
                tracing::warn!("{}", message);
                let error_response = json!({
                    "success": false,
                    "message": message,
                });
                Err((StatusCode::BAD_REQUEST, Json(error_response)).into_response())
            }
        }
    }
}

/// Allows `Option<AppJson<T>>` for routes where the body may be omitted
/// entirely. A request without a JSON content type yields `None`; a present
/// but malformed body is still rejected.
impl<T, S> OptionalFromRequest<S> for AppJson<T>
where
    T: serde::de::DeserializeOwned + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let has_json_body = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));
        if !has_json_body {
            return Ok(None);
        }
        <AppJson<T> as FromRequest<S>>::from_request(req, state)
            .await
            .map(Some)
    }
}
