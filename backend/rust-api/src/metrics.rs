use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Business Metrics
    pub static ref ATTEMPTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quiz_attempts_total",
        "Quiz attempt lifecycle transitions",
        &["status"] // started | resumed | completed
    )
    .unwrap();

    pub static ref ANSWERS_SUBMITTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "quiz_answers_submitted_total",
        "Total number of quiz answers submitted",
        &["correct"]
    )
    .unwrap();

    pub static ref CONTENT_CREATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "content_created_total",
        "Quizzes and flashcards created",
        &["kind"] // quiz | flashcard
    )
    .unwrap();
}

/// Render all registered metrics in the Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Invalid UTF-8 in metrics output: {}", e)))
}

pub fn record_attempt(status: &str) {
    ATTEMPTS_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_answer(correct: bool) {
    let label = if correct { "true" } else { "false" };
    ANSWERS_SUBMITTED_TOTAL.with_label_values(&[label]).inc();
}

pub fn record_content_created(kind: &str) {
    CONTENT_CREATED_TOTAL.with_label_values(&[kind]).inc();
}
