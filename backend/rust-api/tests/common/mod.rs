use std::sync::Arc;

use axum::Router;
use lingodeck_api::{config::Config, create_router, services::AppState};
use mongodb::bson::oid::ObjectId;

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Router backed by a MongoDB client that never connects. The driver only
/// reaches out on the first operation, so routes rejected earlier (auth,
/// path parsing, body validation) can be exercised without a database.
pub async fn create_test_app() -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let config = Config {
        mongo_uri: "mongodb://127.0.0.1:27017".to_string(),
        mongo_database: "lingodeck_test".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
    };

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to build MongoDB client");

    let app_state = Arc::new(AppState::new(config, mongo_client));
    create_router(app_state)
}

/// Bearer token for a synthetic user, signed with the test secret
pub fn auth_token() -> String {
    use lingodeck_api::middlewares::auth::{JwtClaims, JwtService};

    let now = chrono::Utc::now().timestamp();
    let claims = JwtClaims {
        sub: ObjectId::new().to_hex(),
        exp: (now + 3600) as usize,
        iat: now as usize,
    };
    JwtService::new(TEST_JWT_SECRET)
        .generate_token(claims)
        .expect("Failed to sign test token")
}
