use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Middleware collecting HTTP metrics (latency, request count)
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    // Execute the request
    let response = next.run(req).await;

    // Record metrics
    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path])
        .observe(duration);

    response
}

/// Normalize URL path to avoid cardinality explosion
/// Replaces dynamic segments like ObjectIds with placeholders
fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let mut normalized = Vec::new();

    for segment in segments {
        if is_object_id_like(segment) || is_numeric_id(segment) {
            normalized.push("{id}");
        } else {
            normalized.push(segment);
        }
    }

    normalized.join("/")
}

/// Check if a segment looks like a 24-char hex ObjectId
fn is_object_id_like(segment: &str) -> bool {
    segment.len() == 24 && segment.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_numeric_id(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_object_ids() {
        assert_eq!(
            normalize_path("/api/quiz/64f1a2b3c4d5e6f7a8b9c0d1/stats"),
            "/api/quiz/{id}/stats"
        );
    }

    #[test]
    fn keeps_static_segments() {
        assert_eq!(normalize_path("/api/quiz/my/attempts"), "/api/quiz/my/attempts");
    }
}
