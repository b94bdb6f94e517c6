use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any); // TODO: restrict to specific origins in production

    Router::new()
        // Public endpoints (no auth required)
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        // Auth endpoints (mixed: some public, some protected)
        .nest("/api/auth", auth_routes(app_state.clone()))
        .nest("/api/flashcards", flashcard_routes(app_state.clone()))
        .nest("/api/quiz", quiz_routes(app_state.clone()))
        .with_state(app_state)
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn auth_routes(
    app_state: std::sync::Arc<services::AppState>,
) -> Router<std::sync::Arc<services::AppState>> {
    let public_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let protected_routes = Router::new()
        .route("/me", get(handlers::auth::me))
        .route_layer(middleware::from_fn_with_state(
            app_state,
            middlewares::auth::auth_middleware,
        ));

    public_routes.merge(protected_routes)
}

fn flashcard_routes(
    app_state: std::sync::Arc<services::AppState>,
) -> Router<std::sync::Arc<services::AppState>> {
    let public_routes = Router::new()
        .route("/", get(handlers::flashcards::list_flashcards))
        .route("/study/random", get(handlers::flashcards::random_study_set))
        .route(
            "/difficulty/{level}",
            get(handlers::flashcards::flashcards_by_difficulty),
        )
        .route(
            "/category/{category}",
            get(handlers::flashcards::flashcards_by_category),
        )
        .route("/{id}", get(handlers::flashcards::get_flashcard));

    let protected_routes = Router::new()
        .route("/", post(handlers::flashcards::create_flashcard))
        .route("/my/cards", get(handlers::flashcards::my_flashcards))
        .route(
            "/{id}",
            put(handlers::flashcards::update_flashcard)
                .delete(handlers::flashcards::delete_flashcard),
        )
        .route_layer(middleware::from_fn_with_state(
            app_state,
            middlewares::auth::auth_middleware,
        ));

    public_routes.merge(protected_routes)
}

fn quiz_routes(
    app_state: std::sync::Arc<services::AppState>,
) -> Router<std::sync::Arc<services::AppState>> {
    let public_routes = Router::new()
        .route("/", get(handlers::quizzes::list_quizzes))
        .route("/{id}", get(handlers::quizzes::get_quiz));

    let protected_routes = Router::new()
        .route("/", post(handlers::quizzes::create_quiz))
        .route("/my/quizzes", get(handlers::quizzes::my_quizzes))
        .route("/my/attempts", get(handlers::attempts::my_attempts))
        .route(
            "/{id}",
            put(handlers::quizzes::update_quiz).delete(handlers::quizzes::delete_quiz),
        )
        .route("/{id}/stats", get(handlers::quizzes::quiz_statistics))
        .route("/{id}/attempt", post(handlers::attempts::start_attempt))
        .route(
            "/attempt/{attemptId}/answer",
            post(handlers::attempts::submit_answer),
        )
        .route(
            "/attempt/{attemptId}/complete",
            post(handlers::attempts::complete_attempt),
        )
        .route_layer(middleware::from_fn_with_state(
            app_state,
            middlewares::auth::auth_middleware,
        ));

    public_routes.merge(protected_routes)
}
